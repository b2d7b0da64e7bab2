// Core selection exports
pub mod filters;
pub mod selector;

pub use filters::{matches_preference, merge_age_ranges, PreferenceFilter};
pub use selector::{next_dog, select_next, SelectionCriteria};
