// ABOUTME: Git branch name validation.
// ABOUTME: Restricts branch names to a shell-safe subset of git's ref rules.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BranchNameError {
    #[error("branch name cannot be empty")]
    Empty,

    #[error("branch name cannot start with '-' or '/'")]
    BadStart,

    #[error("branch name cannot end with '/' or '.lock'")]
    BadEnd,

    #[error("branch name cannot contain '..' or '//'")]
    BadSequence,

    #[error("invalid character in branch name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(value: &str) -> Result<Self, BranchNameError> {
        if value.is_empty() {
            return Err(BranchNameError::Empty);
        }

        if value.starts_with('-') || value.starts_with('/') {
            return Err(BranchNameError::BadStart);
        }

        if value.ends_with('/') || value.ends_with(".lock") {
            return Err(BranchNameError::BadEnd);
        }

        if value.contains("..") || value.contains("//") {
            return Err(BranchNameError::BadSequence);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.' | '/'))
        {
            return Err(BranchNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self("main".to_string())
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
