use auth_identity::{Credentials, Registration, Role, UserId};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    envelope::{created, ok, ApiResponse, Reply},
    error::{ApiError, ApiResult},
    middleware::{Authenticated, ClientInfo},
    server::AppState,
    validation::{RequestValidation, RequiredFields},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

impl RequestValidation for RegisterRequest {
    type Valid = Registration;

    fn validate(self) -> Result<Registration, ApiError> {
        let mut fields = RequiredFields::new();
        let email = fields.take("email", self.email);
        let login = fields.take("login", self.login);
        let password = fields.take("password", self.password);
        fields.finish()?;

        Ok(Registration {
            email,
            login,
            password,
            phone: self.phone.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

impl RequestValidation for LoginRequest {
    type Valid = Credentials;

    fn validate(self) -> Result<Credentials, ApiError> {
        let mut fields = RequiredFields::new();
        let login = fields.take("login", self.login);
        let password = fields.take("password", self.password);
        fields.finish()?;
        Ok(Credentials { login, password })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl RequestValidation for RefreshRequest {
    type Valid = String;

    fn validate(self) -> Result<String, ApiError> {
        match self.refresh_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::validation("Missing refresh_token")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub email: String,
    pub login: String,
    pub role: Role,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Reply<RegisterResponse>> {
    let Json(request) = body?;
    let registration = request.validate()?;

    let user_id = state.coordinator.register(&registration).await?;
    Ok(created(ApiResponse::success(
        "User registered successfully",
        RegisterResponse { user_id },
    )))
}

pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Reply<LoginResponse>> {
    let Json(request) = body?;
    let credentials = request.validate()?;

    let result = state.coordinator.login(&credentials, &client).await?;
    Ok(ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            user_id: result.identity.user_id,
            email: result.identity.email,
            login: result.identity.login,
            role: result.identity.role,
            access_token: result.tokens.access_token,
            refresh_token: result.tokens.refresh_token,
        },
    )))
}

pub async fn refresh(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Reply<TokenResponse>> {
    let Json(request) = body?;
    let refresh_token = request.validate()?;

    let tokens = state.coordinator.refresh(&refresh_token, &client).await?;
    Ok(ok(ApiResponse::success(
        "Tokens refreshed",
        TokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    )))
}

pub async fn logout(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> ApiResult<Reply<()>> {
    state
        .coordinator
        .logout(&context.identity, &context.token)
        .await?;
    Ok(ok(ApiResponse::message_only("Logout successful")))
}
