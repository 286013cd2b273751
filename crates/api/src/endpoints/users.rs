//! User and session endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use flock_common::AppResult;
use flock_core::{AdminUpdateUserInput, LoginInput, RegisterInput, UpdateProfileInput};
use flock_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::{AuthState, JWT_COOKIE, auth_middleware},
    rate_limit::{rate_limit_auth_middleware, rate_limit_signup_middleware},
    response::MessageResponse,
};

/// User plus a freshly issued token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: user::Model,
    pub token: String,
}

/// Register a new user and start a session.
async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<RegisterInput>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let user = state.user_service.register(req).await?;
    let (jar, body) = start_session(&state, jar, user)?;
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// Log in by email and password.
async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginInput>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let user = state
        .user_service
        .authenticate(&req.email, &req.password)
        .await?;
    let (jar, body) = start_session(&state, jar, user)?;
    Ok((jar, Json(body)))
}

async fn logout(jar: CookieJar) -> (CookieJar, MessageResponse) {
    let jar = jar.remove(Cookie::build(JWT_COOKIE).path("/"));
    (jar, MessageResponse::new("Logged out successfully"))
}

async fn get_profile(
    auth: AuthUser,
    State(state): State<AuthState>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.user_service.get(&auth.id).await?))
}

async fn update_profile(
    auth: AuthUser,
    State(state): State<AuthState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.user_service.update_profile(&auth.id, req).await?))
}

async fn list_users(
    _admin: AdminUser,
    State(state): State<AuthState>,
) -> AppResult<Json<Vec<user::Model>>> {
    Ok(Json(state.user_service.list().await?))
}

async fn get_user(
    _admin: AdminUser,
    State(state): State<AuthState>,
    Path(id): Path<String>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.user_service.get(&id).await?))
}

async fn update_user(
    _admin: AdminUser,
    State(state): State<AuthState>,
    Path(id): Path<String>,
    Json(req): Json<AdminUpdateUserInput>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.user_service.admin_update(&id, req).await?))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AuthState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.user_service.delete(&id).await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, "Admin removed user");
    Ok(MessageResponse::new("User removed"))
}

/// Issue a token and attach it as an HTTP-only cookie.
fn start_session(
    state: &AuthState,
    jar: CookieJar,
    user: user::Model,
) -> AppResult<(CookieJar, AuthResponse)> {
    let token = state.jwt.issue(&user.id, &user.username)?;

    let cookie = Cookie::build((JWT_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookie)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(state.jwt.ttl().num_seconds()))
        .build();

    Ok((jar.add(cookie), AuthResponse { user, token }))
}

pub fn router(state: &AuthState) -> Router<AuthState> {
    let signup = Router::new()
        .route("/", post(register))
        .route_layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_signup_middleware,
        ));

    let login = Router::new()
        .route("/auth", post(login))
        .route_layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_auth_middleware,
        ));

    let private = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route_layer(from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .route("/logout", post(logout))
        .merge(signup)
        .merge(login)
        .merge(private)
}
