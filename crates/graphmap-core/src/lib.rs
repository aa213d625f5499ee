//! GraphMap Core Components
//!
//! This crate provides the pieces shared by the GraphMap binaries: the
//! persisted per-vault settings and their error type.

mod config;
mod error;

pub use config::{Settings, PID_FILE, SETTINGS_DIR, SETTINGS_FILE};
pub use error::CoreError;
