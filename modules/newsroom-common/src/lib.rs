pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::{FileConfig, Secrets};
pub use error::NewsroomError;
pub use types::*;
