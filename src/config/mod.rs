//! Configuration module for rentcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Model (training and artifact) and Server.

mod model_config;
mod server_config;

pub use model_config::ModelEnvConfig;
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub model: ModelEnvConfig,
    pub server: ServerEnvConfig,
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let model = ModelEnvConfig::from_lookup(&lookup).context("Failed to load model config")?;
        let server = ServerEnvConfig::from_lookup(&lookup);
        Ok(Self { model, server })
    }
}
