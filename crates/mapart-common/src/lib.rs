pub mod error;
pub mod types;

pub use error::MapartError;
pub use types::{Result, Rgb};
