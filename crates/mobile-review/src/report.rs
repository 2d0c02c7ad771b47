use serde::Serialize;

/// Build details posted to the review service.
///
/// Only [`crate::validate`] builds one, after every input passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize), serde(deny_unknown_fields))]
pub struct BuildReport {
    app: String,
    artifact_url: String,
    branch: String,
    commit_hash: String,
}

impl BuildReport {
    pub(crate) fn new(
        app: String,
        artifact_url: String,
        branch: String,
        commit_hash: String,
    ) -> Self {
        Self {
            app,
            artifact_url,
            branch,
            commit_hash,
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn artifact_url(&self) -> &str {
        &self.artifact_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn commit_hash(&self) -> &str {
        &self.commit_hash
    }
}

/// Credential for the review service. Sent as a header, never in the body.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}
