pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{DuelError, DuelResult};
pub use types::*;
