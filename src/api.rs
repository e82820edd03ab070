//! HTTP surface over the hero, pet and auth services.
//!
//! sled and bcrypt are synchronous, so every service call runs on the blocking pool
//! through [`blocking`] and never on the async workers.
use crate::auth::{AuthService, Claims, Token, TokenSigner, bearer_token};
use crate::error::{AuthError, FieldError, ServiceError};
use crate::hero::{Hero, HeroDraft};
use crate::hero_service::HeroService;
use crate::pet::{Pet, PetDraft, PetSummary};
use crate::pet_state::{CareAction, DriftSource};
use crate::service::{CareOutcome, PetService, StateReport};
use crate::storage::Store;
use crate::types::CallerIdentity;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pets: PetService,
    pub heroes: HeroService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Store, signer: TokenSigner, drift: Arc<dyn DriftSource>) -> Self {
        Self {
            pets: PetService::new(store.clone(), drift),
            heroes: HeroService::new(store.clone()),
            auth: AuthService::new(store, signer),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    BadRequest(String),
    Internal,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    error: &'static str,
    fields: &'a [FieldError],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
            }
            ApiError::Internal => return internal_error(),
            ApiError::Service(err) => err,
        };

        match &err {
            ServiceError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
            }
            ServiceError::Forbidden => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": err.to_string() }))).into_response()
            }
            ServiceError::ValidationFailed(fields) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody {
                    error: "validation failed",
                    fields,
                }),
            )
                .into_response(),
            // cause already logged where it happened
            ServiceError::Auth(auth) if auth.is_internal() => internal_error(),
            ServiceError::Auth(auth) => {
                warn!(error = %auth, "request rejected");
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": auth.to_string() }))).into_response()
            }
            ServiceError::Storage(_) => internal_error(),
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

/// Run a service call on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => {
            error!(error = %err, "blocking task failed");
            Err(ApiError::Internal)
        }
    }
}

/// Resolved identity of the bearer token on the request.
pub struct Caller(pub CallerIdentity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AuthError::MalformedHeader)?
                    .to_string(),
            ),
            None => None,
        };
        let auth = state.auth.clone();
        let caller = blocking(move || auth.resolve_header(header.as_deref())).await?;
        Ok(Caller(caller))
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct HeroLogin {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VillainRequest {
    #[serde(default)]
    pub villain: String,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login_admin))
        .route("/login-hero", post(login_hero))
        .route("/verify", get(verify))
        .route("/heroes", get(list_heroes).post(create_hero))
        .route("/heroes/city/:city", get(heroes_by_city))
        .route("/heroes/:id", put(update_hero).delete(delete_hero))
        .route("/heroes/:id/pets", get(hero_pets))
        .route("/heroes/:id/face-villain", post(face_villain))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/:id", put(update_pet).delete(delete_pet))
        .route("/pets/:id/feed", post(feed_pet))
        .route("/pets/:id/bathe", post(bathe_pet))
        .route("/pets/:id/walk", post(walk_pet))
        .route("/pets/:id/play", post(play_pet))
        .route("/pets/:id/heal", post(heal_pet))
        .route("/pets/:id/state", get(pet_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn login_admin(
    State(state): State<AppState>,
    body: Result<Json<AdminLogin>, JsonRejection>,
) -> ApiResult<Token> {
    let Json(login) = body?;
    let token = blocking(move || state.auth.login_admin(&login.email, &login.password)).await?;
    Ok(Json(token))
}

async fn login_hero(
    State(state): State<AppState>,
    body: Result<Json<HeroLogin>, JsonRejection>,
) -> ApiResult<Token> {
    let Json(login) = body?;
    let token = blocking(move || state.auth.login_hero(&login.alias, &login.password)).await?;
    Ok(Json(token))
}

#[derive(Serialize)]
struct Verified {
    authorized: bool,
    claims: Claims,
}

// signature and expiry only, nothing here touches storage
async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let result = bearer_token(header).and_then(|token| state.auth.verify(token));

    match result {
        Ok(claims) => Json(Verified {
            authorized: true,
            claims,
        })
        .into_response(),
        Err(err) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authorized": false, "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn list_heroes(State(state): State<AppState>, Caller(caller): Caller) -> ApiResult<Vec<Hero>> {
    let heroes = blocking(move || state.heroes.list_heroes(&caller)).await?;
    Ok(Json(heroes))
}

async fn heroes_by_city(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(city): Path<String>,
) -> ApiResult<Vec<Hero>> {
    let heroes = blocking(move || state.heroes.heroes_by_city(&caller, &city)).await?;
    Ok(Json(heroes))
}

async fn create_hero(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<HeroDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Hero>), ApiError> {
    let Json(draft) = body?;
    let hero = blocking(move || state.heroes.register_hero(&caller, draft)).await?;
    Ok((StatusCode::CREATED, Json(hero)))
}

async fn update_hero(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<HeroDraft>, JsonRejection>,
) -> ApiResult<Hero> {
    let Json(draft) = body?;
    let hero = blocking(move || state.heroes.update_hero(&caller, &id, draft)).await?;
    Ok(Json(hero))
}

async fn delete_hero(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    blocking(move || state.heroes.delete_hero(&caller, &id)).await?;
    Ok(Message::new("hero deleted"))
}

async fn hero_pets(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Vec<PetSummary>> {
    let pets = blocking(move || state.heroes.hero_pets(&caller, &id)).await?;
    Ok(Json(pets))
}

async fn face_villain(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<VillainRequest>, JsonRejection>,
) -> ApiResult<Message> {
    let Json(request) = body?;
    let message =
        blocking(move || state.heroes.face_villain(&caller, &id, &request.villain)).await?;
    Ok(Message::new(message))
}

async fn list_pets(State(state): State<AppState>, Caller(caller): Caller) -> ApiResult<Vec<Pet>> {
    let pets = blocking(move || state.pets.list_pets(&caller)).await?;
    Ok(Json(pets))
}

async fn create_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<PetDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Pet>), ApiError> {
    let Json(draft) = body?;
    let pet = blocking(move || state.pets.add_pet(&caller, draft)).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

async fn update_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<PetDraft>, JsonRejection>,
) -> ApiResult<Pet> {
    let Json(draft) = body?;
    let pet = blocking(move || state.pets.update_pet(&caller, &id, draft)).await?;
    Ok(Json(pet))
}

async fn delete_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    blocking(move || state.pets.delete_pet(&caller, &id)).await?;
    Ok(Message::new("pet deleted"))
}

async fn care(
    state: AppState,
    caller: CallerIdentity,
    id: String,
    action: CareAction,
) -> ApiResult<CareOutcome> {
    let outcome = blocking(move || state.pets.care(&caller, &id, action)).await?;
    Ok(Json(outcome))
}

async fn feed_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<CareOutcome> {
    care(state, caller, id, CareAction::Feed).await
}

async fn bathe_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<CareOutcome> {
    care(state, caller, id, CareAction::Bathe).await
}

async fn walk_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<CareOutcome> {
    care(state, caller, id, CareAction::Walk).await
}

async fn play_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<CareOutcome> {
    care(state, caller, id, CareAction::Play).await
}

async fn heal_pet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<CareOutcome> {
    care(state, caller, id, CareAction::Heal).await
}

async fn pet_state(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<StateReport> {
    let report = blocking(move || state.pets.pet_state(&caller, &id)).await?;
    Ok(Json(report))
}
