//! OAuth 2.0 / OpenID Connect identity provider client.
//!
//! Authorization Code flow with PKCE. [`IdentityProvider::authorize`] builds
//! the provider URL with a random CSRF state and S256 challenge; the caller
//! stores the state and verifier until the callback, then
//! [`IdentityProvider::exchange_code`] redeems the code and reads the
//! userinfo endpoint.

use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, warn};

use notekeep_core::defaults::OAUTH_HTTP_TIMEOUT_SECS;
use notekeep_core::{Error, IdentityProvider, IdentityUser, LoginRedirect, Result};

use crate::config::OAuthConfig;

/// OAuth client with auth, token, and redirect URLs set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Sign-in against a generic OAuth 2.0 provider.
///
/// The `sub` claim of the userinfo response (or `id`, for providers that are
/// not OIDC-compliant) becomes the user id. An email is required.
pub struct OAuthIdentityProvider {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: String,
    scopes: Vec<Scope>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<serde_json::Value>,
    id: Option<serde_json::Value>,
    email: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Result<IdentityUser> {
        let id = self
            .sub
            .or(self.id)
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Identity("userinfo response has no subject".to_string()))?;

        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Identity("userinfo response has no email".to_string()))?;

        Ok(IdentityUser { id, email })
    }
}

fn endpoint_error(key: &'static str) -> impl Fn(oauth2::url::ParseError) -> Error {
    move |e| Error::Config(format!("{} is not a valid URL: {}", key, e))
}

impl OAuthIdentityProvider {
    pub fn new(config: OAuthConfig, redirect_uri: impl Into<String>) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id))
            .set_client_secret(ClientSecret::new(config.client_secret))
            .set_auth_uri(AuthUrl::new(config.auth_url).map_err(endpoint_error("OAUTH_AUTH_URL"))?)
            .set_token_uri(
                TokenUrl::new(config.token_url).map_err(endpoint_error("OAUTH_TOKEN_URL"))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.into()).map_err(endpoint_error("PUBLIC_BASE_URL"))?,
            );

        // Following redirects on the token endpoint could leak the code.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(OAUTH_HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            http,
            userinfo_url: config.userinfo_url,
            scopes: config
                .scopes
                .split_whitespace()
                .map(|s| Scope::new(s.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    fn authorize(&self) -> LoginRedirect {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned())
            .set_pkce_challenge(pkce_challenge)
            .url();

        LoginRedirect {
            url: url.to_string(),
            state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<IdentityUser> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                warn!(
                    subsystem = "identity",
                    op = "token",
                    error = %e,
                    "Token endpoint rejected authorization code"
                );
                Error::Identity(format!("token exchange failed: {}", e))
            })?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token.access_token().secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Identity(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| Error::Identity(format!("invalid userinfo response: {}", e)))?;
        let user = info.into_identity()?;

        debug!(
            subsystem = "identity",
            op = "exchange_code",
            user_id = %user.id,
            "Resolved identity"
        );
        Ok(user)
    }
}
