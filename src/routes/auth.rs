use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::{
    auth,
    error::AppError,
    models::{user::UserResponse, ResponseDto},
    services::user::{LoginRequest, SignupRequest},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<ResponseDto<UserResponse>>, AppError> {
    let user = state.users.signup(&request).await?;
    Ok(Json(ResponseDto::ok(
        "signed up",
        UserResponse::from(&user),
    )))
}

#[derive(Serialize)]
struct LoginResponse {
    access_token: String,
    user: UserResponse,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ResponseDto<LoginResponse>>), AppError> {
    let user = state.users.authenticate(&request).await?;
    let token = auth::issue_token(&state.config, &user)?;
    let jar = auth::apply_token_cookie(jar, token.clone());
    Ok((
        jar,
        Json(ResponseDto::ok(
            "logged in",
            LoginResponse {
                access_token: token,
                user: UserResponse::from(&user),
            },
        )),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<ResponseDto<()>>) {
    (
        auth::clear_token_cookie(jar),
        Json(ResponseDto::empty("logged out")),
    )
}
