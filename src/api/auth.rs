use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ClientError, Result},
    http::{HttpClient, RequestBody},
    models::User,
};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `{ user, token }` returned by login and register.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileResponse {
    user: User,
}

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ClientError::validation("Email and password are required"));
        }
        let response = self.authenticate("/auth/login", RequestBody::json(credentials)?).await?;
        debug!(user = %response.user.id, "login accepted");
        Ok(response)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        if request.name.trim().is_empty() {
            return Err(ClientError::validation("Name is required"));
        }
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ClientError::validation("Email and password are required"));
        }
        self.authenticate("/auth/register", RequestBody::json(request)?)
            .await
    }

    /// Validate the persisted token and return the authoritative user.
    pub async fn profile(&self) -> Result<User> {
        let response: ProfileResponse = self.http.get("/auth/profile", &[]).await?;
        Ok(response.user)
    }

    async fn authenticate(&self, path: &str, body: RequestBody) -> Result<AuthResponse> {
        let response: AuthResponse = self.http.post(path, body).await?;
        if response.token.trim().is_empty() {
            return Err(ClientError::Decode(format!("{path} returned an empty token")));
        }
        Ok(response)
    }
}
