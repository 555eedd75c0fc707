/// Authenticated Earth Engine session
use crate::{
    auth::Authenticator,
    credentials::AccessToken,
    error::{EeError, Result},
    expression::Expression,
};
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Earth Engine REST endpoint.
pub const EARTH_ENGINE_URL: &str = "https://earthengine.googleapis.com";

/// Request timeout; reductions over large regions can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            base_url: EARTH_ENGINE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A project-bound connection holding a bearer token. Created once per run
/// and passed to whatever needs to talk to the service.
#[derive(Debug)]
pub struct Session {
    client: Client,
    project: String,
    token: AccessToken,
    base_url: String,
}

#[derive(Serialize)]
struct ComputeRequest<'a> {
    expression: &'a Expression,
}

#[derive(Deserialize)]
struct ComputeResponse {
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl Session {
    /// Obtain a token and bind it to `project`. No retry.
    pub async fn initialize<A: Authenticator>(
        client: &Client,
        project: &str,
        authenticator: &A,
        options: &SessionOptions,
    ) -> Result<Session> {
        let token = authenticator.access_token(client).await?;
        info!("Earth Engine session initialized for project {}", project);
        Ok(Session {
            client: client.clone(),
            project: project.to_string(),
            token,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Initialize; on failure run the interactive flow once and retry
    /// exactly once. A second failure is returned to the caller.
    pub async fn establish<A: Authenticator>(
        project: &str,
        authenticator: &A,
        options: SessionOptions,
    ) -> Result<Session> {
        if project.trim().is_empty() {
            return Err(EeError::InvalidSession("project id is empty".to_string()));
        }
        let client = Client::builder().timeout(options.timeout).build()?;
        match Session::initialize(&client, project, authenticator, &options).await {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Error initializing Earth Engine: {}", e);
                authenticator.reauthenticate().await?;
                Session::initialize(&client, project, authenticator, &options).await
            }
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Evaluate `expression` remotely and return its value.
    pub async fn compute_value(&self, expression: &Expression) -> Result<Value> {
        if self.token.is_expired(Utc::now()) {
            return Err(EeError::InvalidSession("access token has expired".to_string()));
        }
        let url = format!(
            "{}/v1/projects/{}/value:compute",
            self.base_url, self.project
        );
        debug!("POST {} ({} nodes)", url, expression.values.len());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token.value)
            .json(&ComputeRequest { expression })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(e) => match e.error.status {
                    Some(s) => format!("{} ({})", e.error.message, s),
                    None => e.error.message,
                },
                Err(_) => body,
            };
            return Err(EeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: ComputeResponse = serde_json::from_str(&body)?;
        parsed
            .result
            .ok_or_else(|| EeError::ResponseShape("response has no result".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ExpressionBuilder, ValueNode};
    use std::cell::Cell;

    /// Fails the first `failures` token requests, then succeeds.
    struct ScriptedAuthenticator {
        failures: usize,
        token_calls: Cell<usize>,
        reauth_calls: Cell<usize>,
        reauth_fails: bool,
    }

    impl ScriptedAuthenticator {
        fn failing(failures: usize) -> ScriptedAuthenticator {
            ScriptedAuthenticator {
                failures,
                token_calls: Cell::new(0),
                reauth_calls: Cell::new(0),
                reauth_fails: false,
            }
        }
    }

    impl Authenticator for ScriptedAuthenticator {
        async fn access_token(&self, _client: &Client) -> Result<AccessToken> {
            let call = self.token_calls.get();
            self.token_calls.set(call + 1);
            if call < self.failures {
                Err(EeError::Credentials("expired".to_string()))
            } else {
                Ok(AccessToken::new("test-token"))
            }
        }

        async fn reauthenticate(&self) -> Result<()> {
            self.reauth_calls.set(self.reauth_calls.get() + 1);
            if self.reauth_fails {
                Err(EeError::InteractiveLogin("cancelled".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn options(base_url: &str) -> SessionOptions {
        SessionOptions {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn expression() -> Expression {
        ExpressionBuilder::new().build(ValueNode::constant(42))
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds_without_reauth() {
        let auth = ScriptedAuthenticator::failing(0);
        let session = Session::establish("demo", &auth, options("http://unused"))
            .await
            .unwrap();
        assert_eq!(session.project(), "demo");
        assert_eq!(auth.token_calls.get(), 1);
        assert_eq!(auth.reauth_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_single_reauth_and_retry() {
        let auth = ScriptedAuthenticator::failing(1);
        let session = Session::establish("demo", &auth, options("http://unused")).await;
        assert!(session.is_ok());
        assert_eq!(auth.token_calls.get(), 2);
        assert_eq!(auth.reauth_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failure_after_retry_is_fatal() {
        let auth = ScriptedAuthenticator::failing(5);
        let err = Session::establish("demo", &auth, options("http://unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, EeError::Credentials(_)));
        assert_eq!(auth.token_calls.get(), 2);
        assert_eq!(auth.reauth_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_reauth_skips_retry() {
        let mut auth = ScriptedAuthenticator::failing(1);
        auth.reauth_fails = true;
        let err = Session::establish("demo", &auth, options("http://unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, EeError::InteractiveLogin(_)));
        assert_eq!(auth.token_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_project_is_rejected() {
        let auth = ScriptedAuthenticator::failing(0);
        let err = Session::establish(" ", &auth, options("http://unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, EeError::InvalidSession(_)));
        assert_eq!(auth.token_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_compute_value_posts_expression() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/demo/value:compute")
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "expression": {"result": "0", "values": {"0": {"constantValue": 42}}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": {"type": "FeatureCollection", "features": []}}"#)
            .create_async()
            .await;

        let auth = ScriptedAuthenticator::failing(0);
        let session = Session::establish("demo", &auth, options(&server.url()))
            .await
            .unwrap();
        let value = session.compute_value(&expression()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn test_compute_value_reports_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/demo/value:compute")
            .with_status(429)
            .with_body(
                r#"{"error": {"code": 429, "message": "Too many concurrent aggregations.", "status": "RESOURCE_EXHAUSTED"}}"#,
            )
            .create_async()
            .await;

        let auth = ScriptedAuthenticator::failing(0);
        let session = Session::establish("demo", &auth, options(&server.url()))
            .await
            .unwrap();
        let err = session.compute_value(&expression()).await.unwrap_err();
        match err {
            EeError::Api { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("Too many concurrent aggregations"));
                assert!(message.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compute_value_without_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/demo/value:compute")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let auth = ScriptedAuthenticator::failing(0);
        let session = Session::establish("demo", &auth, options(&server.url()))
            .await
            .unwrap();
        let err = session.compute_value(&expression()).await.unwrap_err();
        assert!(matches!(err, EeError::ResponseShape(_)));
    }
}
