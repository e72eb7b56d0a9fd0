use crate::error::ConfigError;
use std::fmt;
use std::path::Path;

/// IMDb session cookie, copied by the user from a logged-in browser
#[derive(Clone, PartialEq, Eq)]
pub struct ImdbCookie(String);

impl ImdbCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read the cookie file, dropping line breaks and surrounding whitespace
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let cookie = content.replace(['\n', '\r'], "").trim().to_string();
        if cookie.is_empty() {
            return Err(ConfigError::EmptyCookie(path.to_path_buf()));
        }
        Ok(Self(cookie))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the session value
impl fmt::Debug for ImdbCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImdbCookie(***{} chars)", self.0.len())
    }
}
