//! Configuration loading and management

mod loader;

pub use loader::{ConfigLoader, CONFIG_FILE_NAMES};
