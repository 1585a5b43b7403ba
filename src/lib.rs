pub mod config;
pub mod delta;
pub mod engine;
pub mod protocol;
pub mod error;

pub use error::RdeltaError;
pub type Result<T> = std::result::Result<T, RdeltaError>;
