//! Concurrent pet creation
//!
//! All requests are started at once and awaited together; the batch fails on
//! the first request that errors or whose response does not echo what was
//! sent.

use cedar_qa_common::{datagen, FileLogger, Pet};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::info;

use crate::client::PetStoreClient;
use crate::error::{ApiError, ApiResult};

/// Pet-store load-test default
pub const DEFAULT_LOAD_COUNT: usize = 100;

/// Fields a created pet must echo back unchanged
pub const ECHOED_FIELDS: &[&str] = &["name", "category", "photoUrls", "tags", "status"];

/// Compare a create response against the pet that was sent
pub fn verify_echo(index: usize, sent: &Pet, body: &Value) -> ApiResult<()> {
    if body.get("id").is_none() {
        return Err(ApiError::MissingField("id".to_string()));
    }

    let expected = serde_json::to_value(sent)?;
    for field in ECHOED_FIELDS {
        let actual = body
            .get(*field)
            .ok_or_else(|| ApiError::MissingField(field.to_string()))?;
        let wanted = &expected[*field];
        if actual != wanted {
            return Err(ApiError::EchoMismatch {
                index,
                field: field.to_string(),
                expected: wanted.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

async fn create_and_verify(
    client: &PetStoreClient,
    index: usize,
    pet: &Pet,
    logger: &FileLogger,
) -> ApiResult<Pet> {
    logger.info(&format!(
        "Request {}: Adding a pet with data: {}",
        index,
        serde_json::to_string(pet)?
    ))?;

    let outcome = async {
        let response = client.post_json_raw("/pet", pet).await?;
        logger.info(&format!(
            "Response {}: {} - {}",
            index, response.status, response.body
        ))?;

        let response = response.ensure_success()?;
        let body = response.json()?;
        verify_echo(index, pet, &body)?;
        Ok::<Pet, ApiError>(serde_json::from_value(body)?)
    }
    .await;

    if let Err(e) = &outcome {
        logger.error(&format!("Request {} failed: {}", index, e))?;
    }
    outcome
}

/// Create `count` random pets concurrently and verify every echo
pub async fn create_pets_concurrently(
    client: &PetStoreClient,
    count: usize,
    logger: &FileLogger,
) -> ApiResult<Vec<Pet>> {
    let pets: Vec<Pet> = (0..count).map(|_| datagen::generate_random_pet()).collect();
    info!("Creating {} pets concurrently against {}", count, client.base_url());

    let requests = pets
        .iter()
        .enumerate()
        .map(|(i, pet)| create_and_verify(client, i + 1, pet, logger));
    let created = try_join_all(requests).await?;

    info!("Created {} pets", created.len());
    Ok(created)
}
