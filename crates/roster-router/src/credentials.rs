//! Login credential checks.

use roster_core::{CredentialChecker, CredentialsConfig};

/// Accepts exactly one username/password pair.
///
/// Comparison is plain byte equality: no hashing, no case folding, no
/// rate limiting.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<&CredentialsConfig> for StaticCredentials {
    fn from(config: &CredentialsConfig) -> Self {
        Self::new(&config.username, &config.password)
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::from(&CredentialsConfig::default())
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl CredentialChecker for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}
