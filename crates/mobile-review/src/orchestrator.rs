use std::io::Write;

use anyhow::{Context, Result};

use crate::config::{EndpointConfig, Inputs};
use crate::submit::{serialize, SubmitOutcome, Submitter};
use crate::validate::{describe_inputs, validate_auth_token, validate_report_with, Field};

pub const SUCCESS_MESSAGE: &str = "Mobile Review created with success.";

/// Validate the inputs, then post the review. Operator-facing progress is
/// written to `out`; the first failure is returned with the stage as context.
pub async fn run(
    inputs: &Inputs,
    endpoint: EndpointConfig,
    out: &mut impl Write,
) -> Result<SubmitOutcome> {
    for line in describe_inputs(inputs) {
        writeln!(out, "{line}")?;
    }

    let mut accepted = Vec::new();
    let report = validate_report_with(inputs, |field| accepted.push(field));
    report_accepted(out, &accepted)?;
    let report = report.context("Validating input variables")?;

    let token = validate_auth_token(&inputs.auth_token).context("Validating input variables")?;
    report_accepted(out, &[Field::AuthToken])?;

    let body = serialize(&report).context("Encoding mobile review")?;
    let submitter = Submitter::new(endpoint).context("Submitting mobile review")?;
    let outcome = submitter
        .submit(body, &token)
        .await
        .context("Submitting mobile review")?;

    writeln!(out, "{SUCCESS_MESSAGE}")?;
    Ok(outcome)
}

fn report_accepted(out: &mut impl Write, fields: &[Field]) -> Result<()> {
    for field in fields {
        writeln!(out, "Input variable {} provided correctly.", field.key())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::SubmitError;
    use crate::validate::ValidationError;
    use assert_matches::assert_matches;
    use mockito::Matcher;

    fn inputs(token: &str) -> Inputs {
        Inputs {
            app_name: "MyApp".to_string(),
            artifact_url: "https://cdn.example.com/build.apk".to_string(),
            branch: "main".to_string(),
            commit_hash: "abc1234".to_string(),
            auth_token: token.to_string(),
        }
    }

    fn endpoint(url: String) -> EndpointConfig {
        EndpointConfig {
            url,
            ..EndpointConfig::default()
        }
    }

    #[tokio::test]
    async fn full_run_prints_progress_and_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/apps/mobile/")
            .match_header("authorization", "Token 0123456789ab")
            .with_status(201)
            .create_async()
            .await;

        let mut out = Vec::new();
        let outcome = run(
            &inputs("0123456789ab"),
            endpoint(format!("{}/apps/mobile/", server.url())),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, 201);
        mock.assert_async().await;

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Input variable 'app_name': MyApp"));
        assert!(out.contains("Input variable commit_hash provided correctly."));
        assert!(out.contains("Input variable SERVICE_AUTH_TOKEN provided correctly."));
        assert!(out.trim_end().ends_with(SUCCESS_MESSAGE));
        assert!(!out.contains("0123456789ab"));
    }

    #[tokio::test]
    async fn short_token_never_reaches_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut out = Vec::new();
        let err = run(&inputs("short"), endpoint(server.url()), &mut out)
            .await
            .unwrap_err();

        assert_matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::TooShort { field: Field::AuthToken, .. })
        );
        mock.assert_async().await;

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Input variable branch provided correctly."));
        assert!(!out.contains(SUCCESS_MESSAGE));
    }

    #[tokio::test]
    async fn invalid_field_stops_before_later_checks() {
        let mut bad = inputs("0123456789ab");
        bad.artifact_url = "%%%".to_string();

        let mut out = Vec::new();
        let err = run(&bad, endpoint("http://127.0.0.1:9/".to_string()), &mut out)
            .await
            .unwrap_err();

        assert_matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidUrl { .. })
        );
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Input variable app_name provided correctly."));
        assert!(!out.contains("Input variable branch provided correctly."));
    }

    #[tokio::test]
    async fn rejected_review_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(400).create_async().await;

        let mut out = Vec::new();
        let err = run(
            &inputs("0123456789ab"),
            endpoint(format!("{}/", server.url())),
            &mut out,
        )
        .await
        .unwrap_err();

        assert_matches!(
            err.downcast_ref::<SubmitError>(),
            Some(SubmitError::UnexpectedStatus { status: 400, .. })
        );
        let rendered = format!("{err:#}");
        assert!(rendered.starts_with("Submitting mobile review"));
        assert!(rendered.contains("400 Bad Request"));
    }
}
