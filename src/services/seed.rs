use std::path::Path;
use thiserror::Error;
use validator::Validate;
use crate::models::{CreateDogRequest, NewDog};
use crate::services::store::{AdoptionStore, StoreError};

/// Errors that can occur while loading the catalog seed file
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid seed JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid dog at index {index}: {message}")]
    InvalidDog { index: usize, message: String },

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

/// Parse a JSON array of dogs, validating each entry
///
/// Entries use the same shape as the create-dog request, so legacy field
/// names (`image_filename`, `age`) and codes (`m`, `xl`) are accepted.
pub fn parse_seed(json: &str) -> Result<Vec<NewDog>, SeedError> {
    let entries: Vec<CreateDogRequest> = serde_json::from_str(json)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.validate().map_err(|e| SeedError::InvalidDog {
                index,
                message: e.to_string(),
            })?;
            Ok(entry.into_new_dog())
        })
        .collect()
}

/// Load dogs from `path` into an empty catalog
///
/// Returns the number of dogs inserted; a non-empty catalog is left alone.
pub async fn seed_catalog<P: AsRef<Path>>(
    store: &dyn AdoptionStore,
    path: P,
) -> Result<usize, SeedError> {
    let existing = store.count_dogs().await?;
    if existing > 0 {
        tracing::info!("Catalog already holds {} dogs, skipping seed", existing);
        return Ok(0);
    }

    let json = tokio::fs::read_to_string(path.as_ref()).await?;
    let dogs = parse_seed(&json)?;
    let count = dogs.len();

    for dog in dogs {
        store.create_dog(dog).await?;
    }

    tracing::info!("Seeded catalog with {} dogs from {}", count, path.as_ref().display());
    Ok(count)
}
