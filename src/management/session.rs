use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::{
    config::AuthConfig,
    error::AuthError,
    info,
    management::{
        KeyValueStore, WebAuthFlow,
        store::{KEY_ACCESS_TOKEN, KEY_CODE_VERIFIER, KEY_REFRESH_TOKEN, string_value},
    },
    spotify::{self, auth::TokenReply},
    success,
    types::{Credential, PkceChallenge},
    utils, warning,
};

/// Where the session is in the PKCE flow and token lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// Waiting on the interactive authorization window.
    Authorizing,
    /// Trading the authorization code for tokens.
    Exchanging,
    Authenticated(Credential),
    /// Minting a new access token; the held credential stays usable.
    Refreshing(Credential),
}

impl SessionState {
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Authenticated(c) | SessionState::Refreshing(c) => Some(c),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authorizing => "authorizing",
            SessionState::Exchanging => "exchanging",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Refreshing(_) => "refreshing",
        }
    }
}

/// OAuth 2.0 PKCE session against the Spotify accounts service.
///
/// Owns the credential for the whole process. Every credential change is
/// written to the store before the in-memory state moves on, and the pair
/// of tokens is always written in a single `set`.
pub struct AuthSession {
    config: AuthConfig,
    store: Arc<dyn KeyValueStore>,
    flow: Arc<dyn WebAuthFlow>,
    client: Client,
    state: Mutex<SessionState>,
}

impl AuthSession {
    /// Creates a session and rehydrates any credential found in the store.
    pub async fn restore(
        config: AuthConfig,
        store: Arc<dyn KeyValueStore>,
        flow: Arc<dyn WebAuthFlow>,
    ) -> Result<Self, AuthError> {
        let stored = store.get(&[KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN]).await?;
        let state = match string_value(&stored, KEY_ACCESS_TOKEN) {
            Some(access) => SessionState::Authenticated(Credential::new(
                access,
                string_value(&stored, KEY_REFRESH_TOKEN),
            )?),
            None => SessionState::Unauthenticated,
        };

        Ok(Self {
            config,
            store,
            flow,
            client: Client::new(),
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> SessionState {
        lock_state(&self.state).clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        lock_state(&self.state).credential().cloned()
    }

    pub fn access_token(&self) -> Option<String> {
        self.credential().map(|c| c.access_token().to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    /// Runs the full interactive PKCE authorization.
    ///
    /// Any failure wipes the stored tokens and verifier before the error is
    /// returned; the session ends up `Unauthenticated`. Dropping the future
    /// mid-flow has the same outcome. A call made while another flow or
    /// refresh is running is rejected without side effects.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        let code_verifier = utils::generate_code_verifier();
        let pkce = PkceChallenge {
            code_challenge: utils::generate_code_challenge(&code_verifier),
            code_verifier,
            state: utils::generate_state(),
        };
        let (transition, previous) = self.begin(
            SessionState::Authorizing,
            ATTEMPT_KEYS,
            Some(pkce.code_verifier.clone()),
        )?;

        match self.run_authentication(&transition, &pkce, previous).await {
            Ok(credential) => {
                transition.finish(SessionState::Authenticated(credential));
                success!("Authentication successful!");
                Ok(())
            }
            Err(e) => {
                match &e {
                    AuthError::UserCancelled => info!("{}", e),
                    _ => warning!("Authentication failed: {}", e),
                }
                self.clear_stored(ATTEMPT_KEYS).await;
                transition.finish(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    async fn run_authentication(
        &self,
        transition: &Transition<'_>,
        pkce: &PkceChallenge,
        previous: Option<Credential>,
    ) -> Result<Credential, AuthError> {
        let client_id = self.client_id()?;

        // the held pair is withdrawn in the same write that records the verifier
        let mut pending = Map::new();
        pending.insert(KEY_ACCESS_TOKEN.to_string(), Value::Null);
        pending.insert(KEY_REFRESH_TOKEN.to_string(), Value::Null);
        pending.insert(
            KEY_CODE_VERIFIER.to_string(),
            Value::String(pkce.code_verifier.clone()),
        );
        self.store.set(pending).await?;

        let auth_url = spotify::auth::authorize_url(&self.config, &client_id, pkce)?;
        info!("Launching authorization flow...");

        let redirect = self
            .flow
            .launch(&auth_url)
            .await?
            .ok_or(AuthError::UserCancelled)?;
        let code = parse_redirect(&redirect, &pkce.state)?;

        transition.advance(SessionState::Exchanging);
        info!("Exchanging authorization code for tokens...");

        let refresh_fallback = previous.and_then(|c| c.refresh_token().map(str::to_string));
        self.exchange(&client_id, &code, &pkce.code_verifier, refresh_fallback)
            .await
    }

    /// Trades an authorization code and its verifier for tokens.
    ///
    /// A refresh token missing from the response keeps the one already held.
    /// Failure removes both stored tokens. A missing client ID is rejected
    /// before anything changes.
    pub async fn exchange_code_for_tokens(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<(), AuthError> {
        let client_id = self.client_id()?;
        let (transition, previous) = self.begin(SessionState::Exchanging, TOKEN_KEYS, None)?;

        let refresh_fallback = previous.and_then(|c| c.refresh_token().map(str::to_string));
        match self
            .exchange(&client_id, code, code_verifier, refresh_fallback)
            .await
        {
            Ok(credential) => {
                transition.finish(SessionState::Authenticated(credential));
                Ok(())
            }
            Err(e) => {
                transition.finish(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    async fn exchange(
        &self,
        client_id: &str,
        code: &str,
        code_verifier: &str,
        refresh_fallback: Option<String>,
    ) -> Result<Credential, AuthError> {
        let result = self
            .exchange_and_persist(client_id, code, code_verifier, refresh_fallback)
            .await;

        if let Err(e) = &result {
            warning!("Failed to exchange code for tokens: {}", e);
            self.clear_stored(TOKEN_KEYS).await;
        }
        result
    }

    async fn exchange_and_persist(
        &self,
        client_id: &str,
        code: &str,
        code_verifier: &str,
        refresh_fallback: Option<String>,
    ) -> Result<Credential, AuthError> {
        let reply = spotify::auth::exchange_code_pkce(
            &self.client,
            &self.config,
            client_id,
            code,
            code_verifier,
        )
        .await?;
        let credential = credential_from_exchange(reply, refresh_fallback)?;
        self.persist(&credential).await?;
        self.clear_stored(&[KEY_CODE_VERIFIER]).await;
        Ok(credential)
    }

    /// Mints a new access token with the held refresh token.
    ///
    /// Failures leave the existing credential in place, both in memory and
    /// in the store; falling back to [`AuthSession::authenticate`] is up to
    /// the caller.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let current = {
            let mut state = lock_state(&self.state);
            match &*state {
                SessionState::Authenticated(c) if c.refresh_token().is_some() => {
                    let current = c.clone();
                    *state = SessionState::Refreshing(current.clone());
                    current
                }
                SessionState::Unauthenticated | SessionState::Authenticated(_) => {
                    return Err(AuthError::NoRefreshToken);
                }
                _ => return Err(AuthError::RefreshInProgress),
            }
        };
        let transition = Transition {
            state: &self.state,
            fallback: Some(SessionState::Authenticated(current.clone())),
            cleanup: None,
        };

        match self.run_refresh(&current).await {
            Ok(next) => {
                transition.finish(SessionState::Authenticated(next));
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warning!("Token refresh failed: {}", e);
                transition.finish(SessionState::Authenticated(current));
                Err(e)
            }
        }
    }

    async fn run_refresh(&self, current: &Credential) -> Result<Credential, AuthError> {
        let client_id = self.client_id()?;
        let refresh_token = current.refresh_token().ok_or(AuthError::NoRefreshToken)?;

        let reply =
            spotify::auth::refresh_token(&self.client, &self.config, &client_id, refresh_token)
                .await?;
        let credential = credential_from_refresh(reply, refresh_token)?;
        self.persist(&credential).await?;
        Ok(credential)
    }

    /// Moves to `next` unless a flow or refresh already runs.
    ///
    /// The returned transition puts the session back to `Unauthenticated` if
    /// it is dropped before finishing, e.g. when the caller's future is
    /// cancelled while the authorization window is open. `keys` are removed
    /// from the store in that case; with `verifier` set, only while that
    /// verifier is still the stored one.
    fn begin(
        &self,
        next: SessionState,
        keys: &'static [&'static str],
        verifier: Option<String>,
    ) -> Result<(Transition<'_>, Option<Credential>), AuthError> {
        let mut state = lock_state(&self.state);
        let previous = match &*state {
            SessionState::Unauthenticated => None,
            SessionState::Authenticated(c) => Some(c.clone()),
            _ => return Err(AuthError::AuthenticationInProgress),
        };
        *state = next;

        Ok((
            Transition {
                state: &self.state,
                fallback: Some(SessionState::Unauthenticated),
                cleanup: Some(Cleanup {
                    store: Arc::clone(&self.store),
                    keys,
                    verifier,
                }),
            },
            previous,
        ))
    }

    fn client_id(&self) -> Result<String, AuthError> {
        self.config
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::Configuration)
    }

    async fn persist(&self, credential: &Credential) -> Result<(), AuthError> {
        let mut pair = Map::new();
        pair.insert(
            KEY_ACCESS_TOKEN.to_string(),
            Value::String(credential.access_token().to_string()),
        );
        pair.insert(
            KEY_REFRESH_TOKEN.to_string(),
            credential
                .refresh_token()
                .map_or(Value::Null, |t| Value::String(t.to_string())),
        );
        self.store.set(pair).await?;
        Ok(())
    }

    async fn clear_stored(&self, keys: &[&str]) {
        if let Err(e) = self.store.remove(keys).await {
            warning!("Failed to clear stored credentials: {}", e);
        }
    }
}

const ATTEMPT_KEYS: &[&str] = &[KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_CODE_VERIFIER];
const TOKEN_KEYS: &[&str] = &[KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN];

/// Pending state change; reverts to `fallback` when dropped unfinished.
struct Transition<'a> {
    state: &'a Mutex<SessionState>,
    fallback: Option<SessionState>,
    cleanup: Option<Cleanup>,
}

/// Stored keys to drop when a transition is abandoned.
struct Cleanup {
    store: Arc<dyn KeyValueStore>,
    keys: &'static [&'static str],
    /// Verifier of the abandoned attempt; a newer attempt's entries are kept.
    verifier: Option<String>,
}

impl Cleanup {
    /// Runs the removal as a detached task on the current runtime.
    fn spawn(self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            if let Some(verifier) = &self.verifier {
                match self.store.get(&[KEY_CODE_VERIFIER]).await {
                    Ok(stored) => {
                        let current = string_value(&stored, KEY_CODE_VERIFIER);
                        if current.is_some_and(|c| c != *verifier) {
                            return;
                        }
                    }
                    Err(e) => {
                        warning!("Failed to read stored verifier: {}", e);
                        return;
                    }
                }
            }
            if let Err(e) = self.store.remove(self.keys).await {
                warning!("Failed to clear stored credentials: {}", e);
            }
        });
    }
}

impl Transition<'_> {
    fn advance(&self, next: SessionState) {
        *lock_state(self.state) = next;
    }

    fn finish(mut self, next: SessionState) {
        self.fallback = None;
        self.cleanup = None;
        *lock_state(self.state) = next;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if let Some(fallback) = self.fallback.take() {
            *lock_state(self.state) = fallback;
            if let Some(cleanup) = self.cleanup.take() {
                cleanup.spawn();
            }
        }
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Validates the provider redirect and returns the authorization code.
///
/// Order matters: a provider error wins, then the state must match exactly,
/// and only then is the code looked at.
pub fn parse_redirect(redirect: &str, expected_state: &str) -> Result<String, AuthError> {
    let url = Url::parse(redirect)
        .map_err(|e| AuthError::AuthFlow(format!("invalid redirect URL: {}", e)))?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .filter(|d| !d.is_empty())
            .unwrap_or(error);
        return Err(AuthError::ProviderDenied(description.clone()));
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AuthError::SecurityViolation);
    }

    params
        .get("code")
        .filter(|c| !c.is_empty())
        .cloned()
        .ok_or(AuthError::MissingAuthorizationCode)
}

fn credential_from_exchange(
    reply: TokenReply,
    refresh_fallback: Option<String>,
) -> Result<Credential, AuthError> {
    if !reply.status.is_success() {
        let message = reply
            .body
            .as_ref()
            .and_then(|b| b.error_message())
            .unwrap_or_else(|| {
                format!(
                    "Failed to exchange code for tokens ({})",
                    reply.status.as_u16()
                )
            });
        return Err(AuthError::TokenExchangeFailed(message));
    }

    let body = reply.body.ok_or_else(|| {
        AuthError::InvalidProviderResponse("token response is not valid JSON".to_string())
    })?;
    let access_token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AuthError::InvalidProviderResponse("No access token received from Spotify".to_string())
        })?;

    Credential::new(access_token, body.refresh_token.or(refresh_fallback))
}

fn credential_from_refresh(reply: TokenReply, current_refresh: &str) -> Result<Credential, AuthError> {
    let Some(body) = reply.body else {
        return Err(if reply.status.is_success() {
            AuthError::InvalidProviderResponse("token response is not valid JSON".to_string())
        } else {
            AuthError::RefreshRejected(format!(
                "Failed to refresh access token ({})",
                reply.status.as_u16()
            ))
        });
    };

    if body.error.is_some() {
        return Err(AuthError::RefreshRejected(
            body.error_message().unwrap_or_default(),
        ));
    }
    if !reply.status.is_success() {
        return Err(AuthError::RefreshRejected(format!(
            "Failed to refresh access token ({})",
            reply.status.as_u16()
        )));
    }

    let access_token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AuthError::InvalidProviderResponse("No access token received from Spotify".to_string())
        })?;
    let refresh_token = body
        .refresh_token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| current_refresh.to_string());

    Credential::new(access_token, Some(refresh_token))
}
