//! Cedar QA API clients
//!
//! - [`PetStoreClient`]: typed and raw access to the pet-store API
//! - [`create_pets_concurrently`]: the concurrent creation load scenario
//! - [`auth`]: the hosted auth service's development endpoints

pub mod auth;
pub mod client;
pub mod error;
pub mod load;

pub use auth::{AuthClient, AuthSettings};
pub use client::{PetStoreClient, RawResponse};
pub use error::{ApiError, ApiResult};
pub use load::{create_pets_concurrently, verify_echo, DEFAULT_LOAD_COUNT};
