use reqwest::{Client, StatusCode, Url};

use crate::{
    config::AuthConfig,
    error::AuthError,
    types::{PkceChallenge, TokenResponse},
};

/// Raw outcome of a token endpoint call.
///
/// `body` is `None` when the response was not a JSON token document.
#[derive(Debug, Clone)]
pub struct TokenReply {
    pub status: StatusCode,
    pub body: Option<TokenResponse>,
}

/// Builds the authorization URL for one PKCE attempt.
///
/// Only the challenge goes into the URL; the verifier stays local until the
/// code exchange.
pub fn authorize_url(
    config: &AuthConfig,
    client_id: &str,
    pkce: &PkceChallenge,
) -> Result<Url, AuthError> {
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", &config.redirect_uri),
            ("state", &pkce.state),
            ("code_challenge_method", "S256"),
            ("code_challenge", &pkce.code_challenge),
            ("scope", &config.scope()),
        ],
    )
    .map_err(|e| AuthError::AuthFlow(format!("invalid authorization URL: {}", e)))
}

/// Exchanges an authorization code for tokens (`authorization_code` grant).
pub async fn exchange_code_pkce(
    client: &Client,
    config: &AuthConfig,
    client_id: &str,
    code: &str,
    verifier: &str,
) -> Result<TokenReply, reqwest::Error> {
    request_token(
        client,
        &config.token_url,
        &[
            ("client_id", client_id),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config.redirect_uri),
            ("code_verifier", verifier),
        ],
    )
    .await
}

/// Mints a new access token from a refresh token (`refresh_token` grant).
pub async fn refresh_token(
    client: &Client,
    config: &AuthConfig,
    client_id: &str,
    refresh_token: &str,
) -> Result<TokenReply, reqwest::Error> {
    request_token(
        client,
        &config.token_url,
        &[
            ("client_id", client_id),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

async fn request_token(
    client: &Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<TokenReply, reqwest::Error> {
    let res = client.post(token_url).form(form).send().await?;
    let status = res.status();
    let text = res.text().await?;

    Ok(TokenReply {
        status,
        body: serde_json::from_str::<TokenResponse>(&text).ok(),
    })
}
