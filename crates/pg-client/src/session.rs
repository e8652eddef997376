//! Session store: single source of truth for "who is the current user".
//!
//! The store owns the persisted bearer token (a plain string in one file)
//! and the validated [`User`] identity. It is the only writer of either.
//! All operations absorb their failures: callers get indicator values,
//! never a propagated fault.
//!
//! Overlapping operations follow a supersede policy. Every operation that
//! can mutate the session takes a fresh sequence number, and a settling
//! response is applied only if no newer operation (including `logout`)
//! started in the meantime. A late profile or login response can therefore
//! never resurrect a session the user already left.

use crate::api::{ApiTransport, LOGIN_FALLBACK, REGISTER_FALLBACK};
use crate::models::User;
use crate::ClientConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Confirmation returned by a successful registration. The server body is
/// not consumed beyond the success status.
pub const REGISTER_SUCCESS: &str = "Registration successful";

/// Current authentication state.
///
/// `user` is present iff the token was validated by the profile endpoint or
/// just issued by login, so `user.is_some()` implies `token.is_some()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Failure indicator carrying the user-displayable message. Transport
/// failures, non-2xx statuses, and malformed payloads all fold into this
/// one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub message: String,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AuthFailure {}

pub struct SessionStore {
    api: Arc<dyn ApiTransport>,
    token_path: PathBuf,
    session: Mutex<Session>,
    op_seq: AtomicU64,
}

impl SessionStore {
    pub fn new(api: Arc<dyn ApiTransport>, config: &ClientConfig) -> Self {
        Self {
            api,
            token_path: config.token_path.clone(),
            session: Mutex::new(Session::default()),
            op_seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.session.lock().unwrap().clone()
    }

    /// The bearer token, if a session is live.
    pub fn token(&self) -> Option<String> {
        self.session.lock().unwrap().token.clone()
    }

    /// Validate any persisted token against the profile endpoint.
    ///
    /// Without a persisted token this resolves immediately, with zero
    /// network calls. With one, a successful profile check yields a full
    /// session; any failure clears the persisted token and yields no
    /// session. Infallible and idempotent.
    pub async fn initialize(&self) -> Session {
        let Some(token) = self.read_token() else {
            debug!("no persisted token, starting anonymous");
            return self.current();
        };

        let seq = self.begin_op();
        match self.api.profile(&token).await {
            Ok(user) => {
                if self.is_current(seq) {
                    self.set_session(Session {
                        token: Some(token),
                        user: Some(user),
                    });
                } else {
                    debug!("profile response superseded, discarding");
                }
            }
            Err(err) => {
                debug!("profile check failed, clearing session: {err}");
                if self.is_current(seq) {
                    self.forget_token();
                    self.set_session(Session::default());
                }
            }
        }
        self.current()
    }

    /// Exchange credentials for a token, persist it, and adopt the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthFailure> {
        let seq = self.begin_op();
        match self.api.login(username, password).await {
            Ok(resp) => {
                if self.is_current(seq) {
                    self.persist_token(&resp.token);
                    self.set_session(Session {
                        token: Some(resp.token),
                        user: Some(resp.user.clone()),
                    });
                } else {
                    debug!("login response superseded, discarding");
                }
                Ok(resp.user)
            }
            Err(err) => Err(AuthFailure {
                message: err.user_message(LOGIN_FALLBACK),
            }),
        }
    }

    /// Create an account. Does not log in or touch the session.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthFailure> {
        match self.api.register(username, email, password).await {
            Ok(()) => Ok(REGISTER_SUCCESS.to_string()),
            Err(err) => Err(AuthFailure {
                message: err.user_message(REGISTER_FALLBACK),
            }),
        }
    }

    /// Drop the session: remove the persisted token and clear the identity
    /// in one state write. Synchronous and infallible; it also invalidates
    /// any in-flight login or profile response.
    pub fn logout(&self) {
        self.begin_op();
        self.forget_token();
        self.set_session(Session::default());
    }

    fn begin_op(&self) -> u64 {
        self.op_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.op_seq.load(Ordering::SeqCst) == seq
    }

    fn set_session(&self, session: Session) {
        *self.session.lock().unwrap() = session;
    }

    fn read_token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.token_path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn persist_token(&self, token: &str) {
        if let Some(parent) = self.token_path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("failed to create token directory: {err}");
                return;
            }
        }
        if let Err(err) = std::fs::write(&self.token_path, token) {
            warn!("failed to persist token: {err}");
        }
    }

    fn forget_token(&self) {
        match std::fs::remove_file(&self.token_path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove token file: {err}"),
        }
    }
}
