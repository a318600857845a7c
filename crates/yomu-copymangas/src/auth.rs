use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;

use crate::{
    config::SettingsUpdate,
    dto::TokenDto,
    error::Error,
    transport::{Auth, Transport},
};

const MEMBER_INFO: &str = "/api/v3/member/info?platform=3";
const LOGIN: &str = "/api/v3/login?platform=3";

/// Outcome of the last manual token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenState {
    NotStarted = 0,
    InProgress = 1,
    Succeeded = 2,
    StillValid = 3,
    Failed = 4,
}

impl From<u8> for TokenState {
    fn from(value: u8) -> Self {
        match value {
            1 => TokenState::InProgress,
            2 => TokenState::Succeeded,
            3 => TokenState::StillValid,
            4 => TokenState::Failed,
            _ => TokenState::NotStarted,
        }
    }
}

/// What a refresh trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    Started,
    AlreadyRunning,
    /// The last refresh already produced a working token.
    UpToDate,
    MissingCredentials,
}

/// Form body sent to the login endpoint. Values are sent as is, without
/// percent-encoding, which is what the app does.
pub fn login_form(username: &str, password: &str, salt: u32, version: &str) -> String {
    let encoded = STANDARD.encode(format!("{password}-{salt}"));
    format!(
        "username={username}&password={encoded}&salt={salt}&platform=3&authorization=Token+&version={version}&source=copyApp"
    )
}

pub struct AuthManager {
    transport: Arc<Transport>,
    state: AtomicU8,
}

impl AuthManager {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            state: AtomicU8::new(TokenState::NotStarted as u8),
        }
    }

    /// Whether the server accepts `token`. Never fails: errors count as invalid.
    pub fn verify(&self, token: &str) -> bool {
        if token.trim().is_empty() {
            return false;
        }

        match self.transport.get(MEMBER_INFO, Auth::Token(token)) {
            Ok(res) if res.status == 200 => true,
            Ok(res) => {
                info!("token rejected with status {}", res.status);
                false
            }
            Err(e) => {
                error!("failed to verify token: {}", e);
                false
            }
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, Error> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(Error::MissingCredentials);
        }

        let salt = rand::rng().random_range(1000..=9999);
        let version = self.transport.settings().version.clone();
        let form = login_form(username, password, salt, &version);

        let token: TokenDto = self.transport.post_form(LOGIN, form, Auth::Anonymous)?;
        info!("logged in as {}", username);
        Ok(token.token)
    }

    fn store_token(&self, token: String) -> Result<(), Error> {
        self.transport
            .settings_handle()
            .update(SettingsUpdate::Token(token))
            .map(|_| ())
    }

    /// Makes sure a usable token is stored, logging in when the stored one is
    /// rejected and credentials are available. Failures are only logged.
    pub fn bootstrap(&self) {
        let settings = self.transport.settings();
        if self.verify(&settings.token) || !settings.has_credentials() {
            return;
        }

        match self
            .login(&settings.username, &settings.password)
            .and_then(|token| self.store_token(token))
        {
            Ok(_) => info!("token refreshed on startup"),
            Err(e) => error!("failed to fetch token on startup: {}", e),
        }
    }

    pub fn state(&self) -> TokenState {
        TokenState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn reset(&self) {
        self.state
            .store(TokenState::NotStarted as u8, Ordering::SeqCst);
    }

    /// Claims the refresh slot. Only a `Started` result obliges the caller to
    /// run [`AuthManager::run_refresh`].
    pub fn begin_refresh(&self) -> RefreshRequest {
        loop {
            let current = self.state();
            match current {
                TokenState::InProgress => return RefreshRequest::AlreadyRunning,
                TokenState::Succeeded | TokenState::StillValid => {
                    return RefreshRequest::UpToDate;
                }
                TokenState::NotStarted | TokenState::Failed => {}
            }

            if !self.transport.settings().has_credentials() {
                return RefreshRequest::MissingCredentials;
            }

            if self
                .state
                .compare_exchange(
                    current as u8,
                    TokenState::InProgress as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return RefreshRequest::Started;
            }
        }
    }

    pub fn run_refresh(&self) {
        let settings = self.transport.settings();
        let outcome = if self.verify(&settings.token) {
            info!("token is still valid");
            TokenState::StillValid
        } else {
            match self
                .login(&settings.username, &settings.password)
                .and_then(|token| self.store_token(token))
            {
                Ok(_) => {
                    info!("token refreshed");
                    TokenState::Succeeded
                }
                Err(e) => {
                    error!("failed to refresh token: {}", e);
                    TokenState::Failed
                }
            }
        };
        self.state.store(outcome as u8, Ordering::SeqCst);
    }
}
