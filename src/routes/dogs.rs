use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::core::next_dog;
use crate::error::ApiError;
use crate::models::{CreateDogRequest, DecisionResponse, StatusFilter};
use crate::routes::{AppState, AuthenticatedUser};

/// Configure catalog, swipe and selection routes
///
/// `/dog/{id}/next` is registered before `/dog/{id}/{status}` so the
/// preference-driven lookup is not read as a status.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/dogs", web::get().to(list_dogs))
        .route("/dogs", web::post().to(create_dog))
        .route("/dogs/{status}", web::get().to(list_dogs_with_status))
        .route("/dog/{id}", web::get().to(get_dog))
        .route("/dog/{id}", web::delete().to(delete_dog))
        .route("/dog/{id}/next", web::get().to(next_preferred))
        .route("/dog/{id}/{status}", web::put().to(record_decision))
        .route("/dog/{id}/{status}/next", web::get().to(next_with_status));
}

/// GET /api/dogs
async fn list_dogs(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let dogs = state.store.list_dogs().await?;
    Ok(HttpResponse::Ok().json(dogs))
}

/// Add a dog to the catalog
///
/// POST /api/dogs
async fn create_dog(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateDogRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let dog = state.store.create_dog(req.into_inner().into_new_dog()).await?;
    tracing::info!("{} added dog {} ({})", user.username, dog.name, dog.id);

    Ok(HttpResponse::Created().json(dog))
}

/// Dogs the caller has marked with `status`
///
/// GET /api/dogs/{liked|disliked|undecided}
async fn list_dogs_with_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let status: StatusFilter = path.parse()?;
    let dogs = state.store.list_dogs_with_status(user.user_id, status).await?;
    Ok(HttpResponse::Ok().json(dogs))
}

/// GET /api/dog/{id}
async fn get_dog(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let dog_id = path.into_inner();
    let dog = state
        .store
        .get_dog(dog_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Not found: dog {}", dog_id)))?;
    Ok(HttpResponse::Ok().json(dog))
}

/// Remove a dog and every decision about it
///
/// DELETE /api/dog/{id}
async fn delete_dog(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let dog_id = path.into_inner();
    if !state.store.delete_dog(dog_id).await? {
        return Err(ApiError::NotFound(format!("Not found: dog {}", dog_id)));
    }

    tracing::info!("{} deleted dog {}", user.username, dog_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Record the caller's swipe on a dog
///
/// PUT /api/dog/{id}/{liked|disliked|undecided}
///
/// `undecided` clears any earlier decision.
async fn record_decision(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, ApiError> {
    let (dog_id, status) = path.into_inner();
    let status: StatusFilter = status.parse()?;

    let response = match status.decision() {
        Some(decision) => {
            let decision = state
                .store
                .record_decision(user.user_id, dog_id, decision)
                .await?;
            DecisionResponse::from(decision)
        }
        None => {
            let cleared = state.store.clear_decision(user.user_id, dog_id).await?;
            tracing::debug!("Cleared decision {} -> {} (existed: {})", user.user_id, dog_id, cleared);
            DecisionResponse {
                dog: dog_id,
                status: None,
                updated_at: None,
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Next dog after the cursor with an explicit status
///
/// GET /api/dog/{id}/{liked|disliked|undecided}/next
///
/// `id` may be negative to start from the beginning of the catalog.
async fn next_with_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, ApiError> {
    let (cursor, status) = path.into_inner();
    let status: StatusFilter = status.parse()?;

    respond_with_next(&state, &user, cursor, Some(status)).await
}

/// Next undecided dog after the cursor that fits the caller's preferences
///
/// GET /api/dog/{id}/next
async fn next_preferred(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    respond_with_next(&state, &user, path.into_inner(), None).await
}

async fn respond_with_next(
    state: &AppState,
    user: &AuthenticatedUser,
    cursor: i64,
    status: Option<StatusFilter>,
) -> Result<HttpResponse, ApiError> {
    match next_dog(state.store.as_ref(), user.user_id, cursor, status).await? {
        Some(dog) => Ok(HttpResponse::Ok().json(dog)),
        None => {
            tracing::debug!("No more dogs for user {} after {}", user.user_id, cursor);
            Err(ApiError::NotFound("No more dogs".to_string()))
        }
    }
}
