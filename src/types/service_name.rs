// ABOUTME: Service and project names as used by docker compose.
// ABOUTME: Names are substituted into shell templates and lock file names, so the charset stays small.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("service name must start with a letter or digit, found '{0}'")]
    BadStart(char),

    #[error("service name cannot end with '{0}'")]
    BadEnd(char),

    #[error("service name must be lowercase")]
    NotLowercase,

    #[error("invalid character in service name: '{0}'")]
    InvalidChar(char),
}

/// A compose service name: lowercase letters, digits, `-` and `_`.
///
/// Compose itself also accepts `.`; it is left out because names end up in
/// file names such as `<project>.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        let (Some(first), Some(last)) = (value.chars().next(), value.chars().last()) else {
            return Err(ServiceNameError::Empty);
        };

        if value.len() > MAX_LEN {
            return Err(ServiceNameError::TooLong);
        }

        if let Some(c) = value.chars().find(|c| !is_name_char(*c)) {
            return Err(if c.is_ascii_uppercase() {
                ServiceNameError::NotLowercase
            } else {
                ServiceNameError::InvalidChar(c)
            });
        }

        if !first.is_ascii_alphanumeric() {
            return Err(ServiceNameError::BadStart(first));
        }
        if !last.is_ascii_alphanumeric() {
            return Err(ServiceNameError::BadEnd(last));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
