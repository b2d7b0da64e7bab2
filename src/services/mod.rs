// Service exports
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use auth::{hash_password, verify_credentials, verify_password, AuthError, Claims, TokenIssuer};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use seed::{parse_seed, seed_catalog, SeedError};
pub use store::{AdoptionStore, StoreError};
