pub mod ast;
pub(crate) mod compile;
pub mod error;
pub mod evaluator;
pub mod value;
