//! Credential Store
//!
//! Username/password pair guarding the metrics endpoint.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Basic-auth credentials loaded from the auth file
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create credentials, rejecting an empty username
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let credentials = Self {
            username: username.into(),
            password: password.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Load credentials from a JSON or YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let credentials: Credentials = super::read_file(path)?;
        credentials.validate()?;
        Ok(credentials)
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::InvalidCredentials("username must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
