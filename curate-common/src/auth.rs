//! Reviewer authentication predicate
//!
//! The service only needs a yes/no answer for a (username, password) pair.
//! Directory-service backends plug in by implementing [`Authenticator`].

use crate::config::{AuthConfig, AuthMode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Decides whether a login attempt is accepted
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Accepts any non-empty username; for local single-reviewer use
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAccess;

impl Authenticator for OpenAccess {
    fn authenticate(&self, username: &str, _password: &str) -> bool {
        !username.trim().is_empty()
    }
}

/// Fixed username → password table
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: BTreeMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Authenticator for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

/// Build the authenticator selected by the `[auth]` config section
pub fn from_config(config: &AuthConfig) -> Arc<dyn Authenticator> {
    match config.mode {
        AuthMode::Open => {
            info!("Authentication: open access (any non-empty username)");
            Arc::new(OpenAccess)
        }
        AuthMode::Static => {
            let credentials = StaticCredentials::new(config.users.clone());
            if credentials.user_count() == 0 {
                warn!("Authentication: static mode with no users configured; every login will fail");
            } else {
                info!(
                    "Authentication: static credentials for {} users",
                    credentials.user_count()
                );
            }
            Arc::new(credentials)
        }
    }
}
