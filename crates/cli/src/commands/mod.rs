//! CLI Commands

pub mod config;
pub mod generate;
pub mod pets;
pub mod run;

use anyhow::Context;
use cedar_qa_common::Configuration;
use std::path::Path;

/// Load the configuration file named on the command line
pub fn load_configuration(path: &Path) -> anyhow::Result<Configuration> {
    Configuration::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}
