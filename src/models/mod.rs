// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeBucket, Decision, DecisionStatus, Dog, Gender, NewDog, ParseStatusError, Preference,
    PreferenceUpdate, Size, StatusFilter, User,
};
pub use requests::{CreateDogRequest, LoginRequest, RegisterRequest, UpdatePreferencesRequest};
pub use responses::{DecisionResponse, ErrorResponse, HealthResponse, TokenResponse, UserResponse};
