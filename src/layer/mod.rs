pub mod config;
pub mod controller;
pub mod host;
mod simplify;
pub mod throttle;
