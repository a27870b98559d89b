// src/config/mod.rs
pub mod settings;

pub use settings::{DigestConfig, ENV_CONFIG_PATH};
