use async_trait::async_trait;
use thiserror::Error;
use crate::core::SelectionCriteria;
use crate::models::{Decision, DecisionStatus, Dog, NewDog, Preference, PreferenceUpdate, StatusFilter, User};

/// Errors raised by any [`AdoptionStore`] implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The acting user id has no account row, e.g. a token outliving its user
    #[error("Unknown user: {0}")]
    UnknownUser(i64),
}

/// Persistence port for the catalog, decision ledger, preferences and accounts
///
/// All mutations are single atomic operations against the backing store.
/// Implementations return plain records; no implicit save-on-mutate.
#[async_trait]
pub trait AdoptionStore: Send + Sync {
    /// Insert a new account. Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn count_users(&self) -> Result<i64, StoreError>;

    /// Add a dog to the catalog, assigning its id
    async fn create_dog(&self, dog: NewDog) -> Result<Dog, StoreError>;

    async fn get_dog(&self, dog_id: i64) -> Result<Option<Dog>, StoreError>;

    /// All dogs in id order
    async fn list_dogs(&self) -> Result<Vec<Dog>, StoreError>;

    /// Remove a dog and every decision about it. Returns false if it did not exist.
    async fn delete_dog(&self, dog_id: i64) -> Result<bool, StoreError>;

    async fn count_dogs(&self) -> Result<i64, StoreError>;

    /// Create or overwrite the single decision for `(user_id, dog_id)`
    ///
    /// Fails with `NotFound` if the dog does not exist and `UnknownUser` if
    /// the user does not.
    async fn record_decision(
        &self,
        user_id: i64,
        dog_id: i64,
        status: DecisionStatus,
    ) -> Result<Decision, StoreError>;

    /// Drop the decision for `(user_id, dog_id)`, returning whether one existed
    ///
    /// Fails with `NotFound` if the dog does not exist.
    async fn clear_decision(&self, user_id: i64, dog_id: i64) -> Result<bool, StoreError>;

    async fn status_of(&self, user_id: i64, dog_id: i64) -> Result<Option<DecisionStatus>, StoreError>;

    /// Dogs whose decision for this user matches `status`, in id order
    async fn list_dogs_with_status(
        &self,
        user_id: i64,
        status: StatusFilter,
    ) -> Result<Vec<Dog>, StoreError>;

    /// The user's preferences, created with defaults on first access
    ///
    /// Fails with `UnknownUser` when there is no such account.
    async fn get_or_create_preference(&self, user_id: i64) -> Result<Preference, StoreError>;

    /// Partial upsert of the user's preferences
    async fn update_preference(
        &self,
        user_id: i64,
        update: &PreferenceUpdate,
    ) -> Result<Preference, StoreError>;

    /// Smallest-id dog above `cursor` that satisfies `criteria` for this user
    async fn next_dog(
        &self,
        user_id: i64,
        cursor: i64,
        criteria: &SelectionCriteria,
    ) -> Result<Option<Dog>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
