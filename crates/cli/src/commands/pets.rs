//! Pet-Store Commands

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::error;

use cedar_qa_api::{create_pets_concurrently, ApiError, PetStoreClient, DEFAULT_LOAD_COUNT};
use cedar_qa_common::{FileLogger, LogLevel};

use super::generate::PetDisplay;
use crate::output::{print_error, print_item, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum PetsCommands {
    /// Create pets concurrently and verify every echo
    Load {
        /// Number of concurrent create requests
        #[arg(short, long, default_value_t = DEFAULT_LOAD_COUNT)]
        count: usize,

        /// Request/response log file
        #[arg(long, default_value = "logs/pets_load_test.log")]
        log: PathBuf,
    },

    /// Fetch a pet by ID
    Get {
        /// Pet ID
        id: i64,
    },
}

/// Assertion-style failures fail the run; anything else is an error
fn is_test_failure(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { .. } | ApiError::EchoMismatch { .. } | ApiError::MissingField(_))
}

pub async fn execute(cmd: PetsCommands, config_path: &Path, format: OutputFormat) -> Result<bool> {
    let config = super::load_configuration(config_path)?;
    let client = PetStoreClient::from_configuration(&config)?;

    match cmd {
        PetsCommands::Load { count, log } => {
            let logger = FileLogger::open(&log, LogLevel::Info)?;
            let start = Instant::now();
            match create_pets_concurrently(&client, count, &logger).await {
                Ok(created) => {
                    print_success(&format!(
                        "Created and verified {} pet(s) in {} ms (log: {})",
                        created.len(),
                        start.elapsed().as_millis(),
                        log.display()
                    ));
                    Ok(true)
                }
                Err(e) if is_test_failure(&e) => {
                    error!("Load scenario failed: {}", e);
                    print_error(&format!("Load scenario failed: {}", e));
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }
        PetsCommands::Get { id } => match client.get_pet(id).await {
            Ok(pet) => {
                print_item(&PetDisplay(pet), format)?;
                Ok(true)
            }
            Err(e) if is_test_failure(&e) => {
                print_error(&format!("Pet {}: {}", id, e));
                Ok(false)
            }
            Err(e) => Err(e.into()),
        },
    }
}
