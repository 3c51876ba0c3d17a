pub mod interaction;
pub mod manager;
