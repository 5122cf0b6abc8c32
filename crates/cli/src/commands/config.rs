//! Configuration Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::Path;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the loaded configuration with secrets masked
    Show,
}

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl TableDisplay for ConfigEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Key", "Value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.key.clone(), self.value.clone()]
    }
}

/// Keys whose values are never printed
pub fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("password") || key.contains("secret") || key.contains("token")
}

pub fn entries(config: &cedar_qa_common::Configuration) -> Vec<ConfigEntry> {
    config
        .iter()
        .map(|(key, value)| ConfigEntry {
            key: key.to_string(),
            value: if is_secret(key) { "********".to_string() } else { value.to_string() },
        })
        .collect()
}

pub fn execute(cmd: ConfigCommands, path: &Path, format: OutputFormat) -> Result<bool> {
    match cmd {
        ConfigCommands::Show => {
            let config = super::load_configuration(path)?;
            print_list(&entries(&config), format)?;
        }
    }
    Ok(true)
}
