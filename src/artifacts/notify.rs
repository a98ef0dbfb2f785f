//! Build status webhook

use serde::Serialize;
use std::time::Duration;

use super::ArtifactError;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Error message sent when the caller does not supply one
pub const DEFAULT_FAILURE_MESSAGE: &str = "Build failed in GitHub Actions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failure,
}

/// Payload posted to the webhook
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNotification {
    pub build_id: String,
    pub status: BuildStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildNotification {
    pub fn success(build_id: impl Into<String>, artifact_id: Option<String>) -> Self {
        Self {
            build_id: build_id.into(),
            status: BuildStatus::Success,
            artifact_id,
            error: None,
        }
    }

    pub fn failure(build_id: impl Into<String>, error: Option<String>) -> Self {
        Self {
            build_id: build_id.into(),
            status: BuildStatus::Failure,
            artifact_id: None,
            error: Some(error.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())),
        }
    }
}

/// POST `notification` to `url`. One attempt; non-2xx is an error.
pub async fn notify(
    client: &reqwest::Client,
    url: &str,
    notification: &BuildNotification,
) -> Result<(), ArtifactError> {
    tracing::info!(
        "Notifying webhook: build {} {:?}",
        notification.build_id,
        notification.status
    );
    let response = client
        .post(url)
        .json(notification)
        .timeout(WEBHOOK_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Webhook response body: {}", body);
        return Err(ArtifactError::WebhookStatus(status.as_u16()));
    }
    tracing::debug!("Webhook accepted with HTTP {}", status.as_u16());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_payload_shape() {
        let ok = serde_json::to_value(BuildNotification::success("b-1", Some("app.apk".into()))).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"buildId": "b-1", "status": "success", "artifactId": "app.apk"})
        );

        let failed = serde_json::to_value(BuildNotification::failure("b-2", None)).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"buildId": "b-2", "status": "failure", "error": DEFAULT_FAILURE_MESSAGE})
        );
    }

    #[tokio::test]
    async fn test_notify_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/build"))
            .and(body_json(serde_json::json!({
                "buildId": "b-1",
                "status": "success",
                "artifactId": "apk-42"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/hooks/build", server.uri());
        notify(
            &reqwest::Client::new(),
            &url,
            &BuildNotification::success("b-1", Some("apk-42".into())),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_notify_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = notify(
            &reqwest::Client::new(),
            &server.uri(),
            &BuildNotification::failure("b-3", Some("gradle failed".into())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ArtifactError::WebhookStatus(503)));
    }
}
