use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::session::AuthSession;
use crate::api::{ApiClient, RequestSpec};
use crate::error::AppError;
use crate::Result;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateProfileRequest<'a> {
    name: &'a str,
}

/// Account as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Login, registration and profile endpoints. Successful logins are handed
/// to the [`AuthSession`].
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
    session: AuthSession,
}

impl AuthApi {
    pub fn new(client: ApiClient, session: AuthSession) -> Self {
        Self { client, session }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Email and password are required".into(),
            ));
        }

        info!(email, "Logging in");
        let response: AuthResponse = match self
            .client
            .send_json(RequestSpec::post("/auth/login"), &LoginRequest { email, password })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(email, error = %e, "Login failed");
                return Err(e);
            }
        };

        self.session
            .login(&response.access_token, &response.refresh_token)?;
        Ok(response)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Email, password and name are required".into(),
            ));
        }

        info!(email, "Registering account");
        let response: AuthResponse = self
            .client
            .send_json(
                RequestSpec::post("/auth/register"),
                &RegisterRequest { email, password, name },
            )
            .await?;

        self.session
            .login(&response.access_token, &response.refresh_token)?;
        Ok(response)
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get_json(RequestSpec::get("/users/me")).await
    }

    pub async fn update_me(&self, name: &str) -> Result<UserProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name must not be empty".into()));
        }
        self.client
            .send_json(RequestSpec::patch("/users/me"), &UpdateProfileRequest { name })
            .await
    }

    pub fn logout(&self) -> Result<()> {
        self.session.logout()
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }
}
