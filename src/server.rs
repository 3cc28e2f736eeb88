use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tracing::{debug, error, info, warn};

use crate::event::WebhookEvent;
use crate::format::format_event;
use crate::telegram::TelegramClient;

/// Shared application state: the notifier is the only thing requests need.
pub struct AppState {
    telegram: TelegramClient,
}

impl AppState {
    pub fn new(telegram: TelegramClient) -> Self {
        Self { telegram }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// One inbound GitLab event: parse, format, relay, answer.
///
/// Only a parse failure maps to a 500. Everything else, including events we
/// have no template for, answers 200, so GitLab never retries payloads this
/// service simply does not relay.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    body: String,
) -> (StatusCode, &'static str) {
    debug!("Received webhook body: {}", body);

    let event = match WebhookEvent::from_json(&body) {
        Ok(event) => event,
        Err(err) => {
            error!("Failed to parse GitLab event: {:#}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process GitLab event",
            );
        }
    };

    if let WebhookEvent::Unknown { kind } = &event {
        warn!("No template for event kind: {}", kind);
    }

    let message = format_event(&event);
    if message.is_empty() {
        // Nothing to relay, e.g. a comment on a commit or an issue.
        return (StatusCode::OK, "Event processed");
    }

    // Delivery outcome is logged but does not change the inbound response:
    // a broken chat credential must not make GitLab retry the webhook.
    match state.telegram.send_message(&message).await {
        Ok(status) if status.is_success() => info!("Message delivered"),
        Ok(status) => warn!("Telegram API returned {}", status),
        Err(err) => error!("Failed to deliver message: {:#}", err),
    }

    (StatusCode::OK, "Event processed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Bind the real router to an ephemeral port, pointed at a fake Telegram.
    async fn spawn_app(api_base: String) -> String {
        let state = Arc::new(AppState::new(TelegramClient::new(TelegramConfig {
            bot_token: "test-token".to_string(),
            chat_id: "42".to_string(),
            api_base,
        })));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_merge_request_open_end_to_end() {
        let telegram = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/sendMessage"))
            .and(query_param_contains("text", r"Fix \[bug\]"))
            .and(query_param_contains("text", r"feat\-1"))
            .and(query_param_contains("text", "main"))
            .and(query_param_contains("text", r"A\. Ivanov"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&telegram)
            .await;

        let app = spawn_app(telegram.uri()).await;
        let body = json!({
            "object_kind": "merge_request",
            "user": { "name": "A. Ivanov" },
            "object_attributes": {
                "action": "open",
                "title": "Fix [bug]",
                "source_branch": "feat-1",
                "target_branch": "main",
                "url": "https://x/1"
            }
        });

        let response = reqwest::Client::new()
            .post(format!("{app}/webhook"))
            .body(body.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_relayed_as_diagnostic() {
        let telegram = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/sendMessage"))
            .and(query_param_contains("text", "tag_push"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&telegram)
            .await;

        let app = spawn_app(telegram.uri()).await;
        let response = reqwest::Client::new()
            .post(format!("{app}/webhook"))
            .body(json!({ "object_kind": "tag_push" }).to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_note_on_commit_sends_nothing() {
        let telegram = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&telegram)
            .await;

        let app = spawn_app(telegram.uri()).await;
        let body = json!({
            "object_kind": "note",
            "user": { "name": "A" },
            "object_attributes": { "note": "nice", "noteable_type": "Commit" }
        });

        let response = reqwest::Client::new()
            .post(format!("{app}/webhook"))
            .body(body.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_500() {
        let telegram = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&telegram)
            .await;

        let app = spawn_app(telegram.uri()).await;
        let response = reqwest::Client::new()
            .post(format!("{app}/webhook"))
            .body("definitely not json")
            .send()
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_change_the_response() {
        let telegram = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&telegram)
            .await;

        let app = spawn_app(telegram.uri()).await;
        let body = json!({
            "object_kind": "pipeline",
            "object_attributes": { "status": "failed" }
        });

        let response = reqwest::Client::new()
            .post(format!("{app}/webhook"))
            .body(body.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let telegram = MockServer::start().await;
        let app = spawn_app(telegram.uri()).await;

        let response = reqwest::get(format!("{app}/health")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }
}
