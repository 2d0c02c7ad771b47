//! Input checks run before anything is sent.
//!
//! Fields are checked in a fixed order and the first failure wins. Nothing
//! here exits the process; callers get a [`ValidationError`] back.

use thiserror::Error;
use url::Url;

use crate::config::{
    Inputs, APP_NAME_KEY, ARTIFACT_URL_KEY, AUTH_TOKEN_KEY, BRANCH_KEY, COMMIT_HASH_KEY,
};
use crate::report::{AuthToken, BuildReport};

pub const MIN_COMMIT_HASH_LEN: usize = 7;
pub const MIN_AUTH_TOKEN_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AppName,
    ArtifactUrl,
    Branch,
    CommitHash,
    AuthToken,
}

impl Field {
    /// Human name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Field::AppName => "App name",
            Field::ArtifactUrl => "Artifact URL",
            Field::Branch => "Branch name",
            Field::CommitHash => "Commit hash",
            Field::AuthToken => "Auth token",
        }
    }

    /// Input variable the field is read from.
    pub fn key(self) -> &'static str {
        match self {
            Field::AppName => APP_NAME_KEY,
            Field::ArtifactUrl => ARTIFACT_URL_KEY,
            Field::Branch => BRANCH_KEY,
            Field::CommitHash => COMMIT_HASH_KEY,
            Field::AuthToken => AUTH_TOKEN_KEY,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} not provided, please fulfill {}'s input variable.", .0.label(), .0.key())]
    Missing(Field),

    #[error(
        "{} not provided, please fulfill {}'s input variable. ({reason})",
        Field::ArtifactUrl.label(),
        Field::ArtifactUrl.key()
    )]
    InvalidUrl { reason: String },

    #[error(
        "{} not provided, please fulfill {}'s input variable. (expected at least {min} characters, got {len})",
        .field.label(),
        .field.key()
    )]
    TooShort { field: Field, min: usize, len: usize },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::InvalidUrl { .. } => Field::ArtifactUrl,
            ValidationError::TooShort { field, .. } => *field,
        }
    }
}

pub fn validate_app_name(name: &str) -> Result<(), ValidationError> {
    non_empty(Field::AppName, name)
}

pub fn validate_artifact_url(artifact: &str) -> Result<(), ValidationError> {
    parse_artifact_url(artifact)
        .map(|_| ())
        .map_err(|reason| ValidationError::InvalidUrl { reason })
}

pub fn validate_branch(branch: &str) -> Result<(), ValidationError> {
    non_empty(Field::Branch, branch)
}

pub fn validate_commit_hash(hash: &str) -> Result<(), ValidationError> {
    min_len(Field::CommitHash, hash, MIN_COMMIT_HASH_LEN)
}

pub fn validate_auth_token(token: &str) -> Result<AuthToken, ValidationError> {
    min_len(Field::AuthToken, token, MIN_AUTH_TOKEN_LEN)?;
    Ok(AuthToken::new(token.to_string()))
}

/// Check the four report fields in order and build the report.
pub fn validate_report(inputs: &Inputs) -> Result<BuildReport, ValidationError> {
    validate_report_with(inputs, |_| {})
}

/// Like [`validate_report`], calling `on_pass` after each field that passes.
pub fn validate_report_with(
    inputs: &Inputs,
    mut on_pass: impl FnMut(Field),
) -> Result<BuildReport, ValidationError> {
    let mut pass = |field: Field| {
        tracing::debug!(key = field.key(), "input variable accepted");
        on_pass(field);
    };

    validate_app_name(&inputs.app_name)?;
    pass(Field::AppName);
    validate_artifact_url(&inputs.artifact_url)?;
    pass(Field::ArtifactUrl);
    validate_branch(&inputs.branch)?;
    pass(Field::Branch);
    validate_commit_hash(&inputs.commit_hash)?;
    pass(Field::CommitHash);

    Ok(BuildReport::new(
        inputs.app_name.clone(),
        inputs.artifact_url.clone(),
        inputs.branch.clone(),
        inputs.commit_hash.clone(),
    ))
}

/// `Input variable '<key>': <value>` lines for the four report fields.
pub fn describe_inputs(inputs: &Inputs) -> Vec<String> {
    [
        (APP_NAME_KEY, &inputs.app_name),
        (ARTIFACT_URL_KEY, &inputs.artifact_url),
        (BRANCH_KEY, &inputs.branch),
        (COMMIT_HASH_KEY, &inputs.commit_hash),
    ]
    .iter()
    .map(|(key, value)| format!("Input variable '{key}': {value}"))
    .collect()
}

fn non_empty(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

// Byte length, so multi-byte characters count once per byte.
fn min_len(field: Field, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    if value.len() < min {
        return Err(ValidationError::TooShort {
            field,
            min,
            len: value.len(),
        });
    }
    Ok(())
}

fn parse_artifact_url(raw: &str) -> Result<Url, String> {
    if raw.trim().is_empty() {
        return Err("value is empty".to_string());
    }
    if let Some(offset) = bad_percent_escape(raw) {
        return Err(format!("malformed percent-encoding at byte {offset}"));
    }
    Url::parse(raw).map_err(|e| e.to_string())
}

/// Offset of the first `%` not followed by two hex digits.
fn bad_percent_escape(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .map(|(i, _)| i)
        .find(|&i| {
            !matches!(
                bytes.get(i + 1..i + 3),
                Some(escape) if escape.iter().all(u8::is_ascii_hexdigit)
            )
        })
}
