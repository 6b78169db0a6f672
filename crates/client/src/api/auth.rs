//! Auth backend adapter (`/auth/*`).

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use shelfmark_core::{CurrencyCode, Email, UserType};
use tracing::instrument;

use super::conversions::convert_auth;
use super::http::HttpClient;
use super::types::{AuthSession, SignUpRequest, UserUpdate};
use super::{ApiError, AuthApi};

#[derive(Serialize)]
struct SignUpBody<'a> {
    name: String,
    email: &'a str,
    password: &'a str,
    #[serde(rename = "type")]
    user_type: UserType,
    #[serde(rename = "preferedCurrency")]
    preferred_currency: &'a CurrencyCode,
}

#[derive(Serialize)]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for registration, login and profile updates.
#[derive(Clone)]
pub struct AuthClient {
    http: HttpClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        let body = SignUpBody {
            name: request.name.trim().to_lowercase(),
            email: request.email.as_str(),
            password: request.password.expose_secret(),
            user_type: request.user_type,
            preferred_currency: &request.preferred_currency,
        };
        let url = self.http.url("auth/signup")?;
        self.http
            .execute_discard(self.http.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, ApiError> {
        let body = SignInBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let url = self.http.url("auth/signin")?;
        let response: Value = self
            .http
            .execute(self.http.request(Method::POST, url).json(&body))
            .await?;
        Ok(convert_auth(response)?)
    }

    #[instrument(skip(self, update))]
    async fn update_user(&self, update: &UserUpdate) -> Result<AuthSession, ApiError> {
        let url = self.http.url("auth/user")?;
        let response: Value = self
            .http
            .execute(self.http.request(Method::PUT, url).json(update))
            .await?;
        Ok(convert_auth(response)?)
    }
}
