//! Pug or Ugh - matching service for the dog adoption app
//!
//! Users register, store adoption preferences and swipe through the dog
//! catalog. The service records each decision and answers "which dog comes
//! next after this one" for a given status or for the user's preferences.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{next_dog, select_next, SelectionCriteria};
pub use crate::error::ApiError;
pub use models::{AgeBucket, Decision, DecisionStatus, Dog, Gender, NewDog, Preference, Size, StatusFilter};
pub use routes::{configure_app, AppState};
pub use services::{AdoptionStore, MemoryStore, PostgresStore, StoreError, TokenIssuer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(AgeBucket::for_age(24), Some(AgeBucket::Adult));
        assert_eq!(SelectionCriteria::explicit(StatusFilter::Liked).preference, None);
    }
}
