pub mod error;
pub mod parser;
pub mod setup;
pub mod utils;
