use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::EndpointConfig;
use crate::report::{AuthToken, BuildReport};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to encode JSON object {report:?}")]
    Serialization {
        report: BuildReport,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create new request with endpoint {endpoint}: {reason}")]
    RequestConstruction { endpoint: String, reason: String },

    #[error("Failed to execute request with endpoint {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "Request {method} {url} was not accepted\nResponse Status Code: {status}\nResponse string: {status_line}"
    )]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        status_line: String,
    },
}

/// What the service answered when it accepted the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub status: u16,
    pub status_line: String,
}

/// Encode the report as the JSON request body.
pub fn serialize(report: &BuildReport) -> Result<Vec<u8>, SubmitError> {
    serde_json::to_vec(report).map_err(|source| SubmitError::Serialization {
        report: report.clone(),
        source,
    })
}

/// Posts encoded reports to the review endpoint.
#[derive(Debug)]
pub struct Submitter {
    client: reqwest::Client,
    endpoint: EndpointConfig,
}

impl Submitter {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, SubmitError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = endpoint.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SubmitError::RequestConstruction {
                endpoint: endpoint.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, endpoint })
    }

    /// Send one `POST` and wait for the answer. Only the configured status
    /// (201 unless overridden) counts as success.
    pub async fn submit(
        &self,
        body: Vec<u8>,
        token: &AuthToken,
    ) -> Result<SubmitOutcome, SubmitError> {
        let request = self.build_request(body, token)?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::info!(%method, %url, "submitting mobile review");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| SubmitError::Transport {
                endpoint: self.endpoint.url.clone(),
                source,
            })?;

        let status = response.status();
        let status_line = status_line(&response);
        tracing::debug!(status = status.as_u16(), "review service responded");

        if status.as_u16() != self.endpoint.expected_status {
            if let Ok(text) = response.text().await {
                tracing::debug!(body = %text, "rejected response body");
            }
            return Err(SubmitError::UnexpectedStatus {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                status_line,
            });
        }

        Ok(SubmitOutcome {
            status: status.as_u16(),
            status_line,
        })
    }

    fn build_request(
        &self,
        body: Vec<u8>,
        token: &AuthToken,
    ) -> Result<reqwest::Request, SubmitError> {
        let construction = |reason: String| SubmitError::RequestConstruction {
            endpoint: self.endpoint.url.clone(),
            reason,
        };

        let url = Url::parse(&self.endpoint.url).map_err(|e| construction(e.to_string()))?;
        let mut auth = HeaderValue::from_str(&token.header_value())
            .map_err(|_| construction("auth token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        self.client
            .request(Method::POST, url)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .build()
            .map_err(|e| construction(e.to_string()))
    }
}

/// `<code> <reason>` as the server sent it. hyper only records the reason
/// phrase when it differs from the canonical one.
fn status_line(response: &Response) -> String {
    let status: StatusCode = response.status();
    let reason = response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string));
    match reason {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
