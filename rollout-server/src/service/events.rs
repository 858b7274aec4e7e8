//! Event Service
//!
//! The events module's backend. Every event is written to the log; events
//! addressed to the `slack` topic are also posted to an incoming webhook
//! when one is configured.

use async_trait::async_trait;
use reqwest::Client;
use rollout_core::domain::Event;
use serde::Serialize;

use super::{ProviderError, Result};

const SLACK_TOPIC: &str = "slack";

/// Notification backend
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn log(&self, event: &Event) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
    attachments: Vec<SlackAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    text: &'a str,
    fields: Vec<SlackField<'a>>,
    ts: i64,
}

#[derive(Debug, Serialize)]
struct SlackField<'a> {
    title: &'a str,
    value: &'a str,
    short: bool,
}

impl<'a> From<&'a Event> for SlackMessage<'a> {
    fn from(event: &'a Event) -> Self {
        SlackMessage {
            text: &event.message,
            attachments: vec![SlackAttachment {
                text: &event.description,
                fields: event
                    .fields
                    .iter()
                    .map(|field| SlackField {
                        title: &field.title,
                        value: &field.value,
                        short: false,
                    })
                    .collect(),
                ts: event.timestamp.timestamp(),
            }],
        }
    }
}

/// Logs events and forwards Slack-bound ones to a webhook
#[derive(Debug, Clone)]
pub struct StandardEventSink {
    client: Client,
    slack_webhook: Option<String>,
}

impl StandardEventSink {
    pub fn new(client: Client, slack_webhook: Option<String>) -> Self {
        Self {
            client,
            slack_webhook,
        }
    }
}

#[async_trait]
impl EventSink for StandardEventSink {
    async fn log(&self, event: &Event) -> Result<()> {
        tracing::info!(
            topics = ?event.topics,
            "{}: {}",
            event.message,
            event.description
        );
        for field in &event.fields {
            tracing::debug!("  {}: {}", field.title, field.value);
        }

        let Some(webhook) = &self.slack_webhook else {
            return Ok(());
        };
        if !event.topics.iter().any(|topic| topic == SLACK_TOPIC) {
            return Ok(());
        }

        let response = self
            .client
            .post(webhook)
            .json(&SlackMessage::from(event))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Webhook {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use rollout_core::domain::EventField;
    use std::sync::{Arc, Mutex};

    fn event(topics: &[&str]) -> Event {
        Event {
            message: "Applied pipeline p".to_string(),
            description: "Applied 1 deployments while executing pipeline p".to_string(),
            timestamp: Utc::now(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            fields: vec![EventField {
                title: "c ∞ ns ∞ d".to_string(),
                value: "updated to image:tag".to_string(),
            }],
        }
    }

    async fn webhook() -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(body);
                    "ok"
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/hook", addr), received)
    }

    #[tokio::test]
    async fn test_posts_slack_events_to_webhook() {
        let (url, received) = webhook().await;
        let sink = StandardEventSink::new(Client::new(), Some(url));

        sink.log(&event(&["slack"])).await.unwrap();
        sink.log(&event(&["audit"])).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["text"], "Applied pipeline p");
        assert_eq!(received[0]["attachments"][0]["fields"][0]["title"], "c ∞ ns ∞ d");
    }

    #[tokio::test]
    async fn test_without_webhook_only_logs() {
        let sink = StandardEventSink::new(Client::new(), None);
        sink.log(&event(&["slack"])).await.unwrap();
    }
}
