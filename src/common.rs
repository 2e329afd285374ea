pub mod error;
pub mod formatters;
pub mod logging;
