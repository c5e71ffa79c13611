//! Browser-based Authentication Gateway
//!
//! Implements the OAuth 2.0 authorization code flow with PKCE (RFC 7636)
//! against the Spotify accounts service, driving the system browser for the
//! interactive step.
//!
//! # Security
//!
//! - Generates cryptographically secure random state and code verifier
//! - Uses the S256 challenge method; the verifier never leaves the process
//!   until the code exchange
//! - Validates the state parameter to prevent CSRF attacks
//! - Never logs sensitive values (tokens, codes, verifiers)

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::{
    auth::{AuthGateway, LoginRequest, TokenGrant},
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy},
};
use bytes::Bytes;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Spotify authorization endpoint.
const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

/// Spotify token endpoint.
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// PKCE parameters generated for one login attempt.
#[derive(Debug, Clone)]
struct PkceParams {
    /// The code verifier (base64-url-encoded random string)
    verifier: String,
    /// The state parameter for CSRF protection
    state: String,
}

impl PkceParams {
    /// Generate fresh PKCE parameters.
    ///
    /// - A 32-byte random code verifier (43 characters after encoding,
    ///   within the 43-128 range RFC 7636 requires)
    /// - A 16-byte random state parameter
    ///
    /// Both values use URL-safe base64 encoding without padding.
    fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    /// Compute the code challenge from the verifier.
    ///
    /// Uses S256 method: BASE64URL(SHA256(code_verifier))
    fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        let hash = hasher.finalize();
        URL_SAFE_NO_PAD.encode(hash)
    }
}

/// State carried between `launch_login` and `exchange_callback`.
#[derive(Debug)]
struct PendingLogin {
    pkce: PkceParams,
    client_id: String,
    redirect_uri: String,
}

/// Auth gateway driving the system browser through the PKCE flow.
///
/// One login attempt can be pending at a time; launching a new one replaces
/// any earlier attempt whose callback never arrived.
pub struct BrowserAuthGateway {
    http_client: Arc<dyn HttpClient>,
    client_id: String,
    pending: Mutex<Option<PendingLogin>>,
}

impl BrowserAuthGateway {
    /// Create a new browser auth gateway.
    ///
    /// `client_id` is used for token renewal, where no [`LoginRequest`] is
    /// in play.
    pub fn new(http_client: Arc<dyn HttpClient>, client_id: impl Into<String>) -> Self {
        Self {
            http_client,
            client_id: client_id.into(),
            pending: Mutex::new(None),
        }
    }

    /// Build the authorization URL and record the pending attempt.
    ///
    /// Split out from `launch_login` so the URL construction is testable
    /// without opening a browser.
    async fn prepare_login(&self, request: &LoginRequest) -> Result<String> {
        let pkce = PkceParams::new();
        let challenge = pkce.challenge();

        let mut url = Url::parse(AUTHORIZE_URL)
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &request.client_id);
            query.append_pair("response_type", "code");
            query.append_pair("redirect_uri", &request.redirect_uri);
            query.append_pair("scope", &request.scopes.join(" "));
            query.append_pair("state", &pkce.state);
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
        }

        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            warn!("Replacing pending login attempt");
        }
        *pending = Some(PendingLogin {
            pkce,
            client_id: request.client_id.clone(),
            redirect_uri: request.redirect_uri.clone(),
        });

        debug!("Built authorization URL");
        Ok(url.to_string())
    }

    /// POST a form to the token endpoint and parse the grant.
    async fn request_token(&self, params: &HashMap<&str, &str>) -> Result<TokenGrant> {
        let encoded_body = serde_urlencoded::to_string(params).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode token request: {}", e))
        })?;

        let request = HttpRequest::new(HttpMethod::Post, TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        // Authorization codes and refresh grants are single-use; a blind
        // retry would resubmit a consumed code.
        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::single_attempt())
            .await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status = status, "Token endpoint returned an error");
            return Err(BridgeError::Http {
                status,
                message: error_body,
            });
        }

        let token_response: TokenResponse = response.json()?;

        Ok(TokenGrant::new(
            token_response.access_token,
            token_response.refresh_token,
            Some(token_response.expires_in),
        ))
    }
}

#[async_trait]
impl AuthGateway for BrowserAuthGateway {
    #[instrument(skip(self, request))]
    async fn launch_login(&self, request: &LoginRequest) -> Result<()> {
        let url = self.prepare_login(request).await?;

        info!("Opening system browser for authorization");
        webbrowser::open(&url)
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to open browser: {}", e)))?;

        Ok(())
    }

    #[instrument(skip(self, url))]
    async fn exchange_callback(&self, url: &str) -> Result<TokenGrant> {
        let parsed = Url::parse(url)
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid callback URL: {}", e)))?;

        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        if let Some(error) = query.get("error") {
            return Err(BridgeError::OperationFailed(format!(
                "Authorization denied: {}",
                error
            )));
        }

        let code = query
            .get("code")
            .ok_or_else(|| {
                BridgeError::OperationFailed("Callback carries no authorization code".to_string())
            })?
            .clone();

        // The pending attempt is consumed either way; a failed exchange
        // requires a fresh launch.
        let pending = self.pending.lock().await.take().ok_or_else(|| {
            BridgeError::OperationFailed("No login attempt is pending".to_string())
        })?;

        // Verify state to prevent CSRF attacks
        let state = query.get("state").map(String::as_str).unwrap_or("");
        if state != pending.pkce.state {
            warn!("OAuth state mismatch on callback");
            return Err(BridgeError::OperationFailed(
                "State parameter mismatch".to_string(),
            ));
        }

        debug!("Exchanging authorization code for tokens");

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code.as_str());
        params.insert("redirect_uri", pending.redirect_uri.as_str());
        params.insert("client_id", pending.client_id.as_str());
        params.insert("code_verifier", pending.pkce.verifier.as_str());

        let grant = self.request_token(&params).await?;
        info!("Authorization code exchanged");
        Ok(grant)
    }

    #[instrument(skip(self, refresh_token))]
    async fn renew(&self, refresh_token: &str) -> Result<TokenGrant> {
        debug!("Renewing access token");

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", self.client_id.as_str());

        let grant = self.request_token(&params).await?;
        info!("Access token renewed");
        Ok(grant)
    }
}

/// Token response from the Spotify accounts service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}
