//! Redirect glue for the upstream identity provider. The core treats whatever
//! comes back from the userinfo endpoint as a trusted assertion; there is no
//! independent verification beyond the provider's protocol.

use serde::Deserialize;
use thiserror::Error;

use crate::config::OAuthConfig;
use crate::identity::ExternalIdentity;

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URI: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("identity provider request failed: {0}")]
    Provider(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Consent-screen URL the browser is redirected to.
    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTH_URI}?response_type=code&client_id={}&redirect_uri={}&scope=openid%20email%20profile",
            self.config.client_id, self.config.redirect_uri
        )
    }

    /// Exchange the callback code for tokens and fetch the profile.
    pub async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, OAuthError> {
        let response = self
            .http
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OAuthError::Provider(format!(
                "code exchange returned HTTP {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))?;

        let response = self
            .http
            .get(USERINFO_URI)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OAuthError::Provider(format!(
                "userinfo returned HTTP {}",
                response.status()
            )));
        }
        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))?;

        Ok(ExternalIdentity {
            email: info.email,
            given_name: info.given_name,
            family_name: info.family_name,
            external_id: info.sub,
        })
    }
}
