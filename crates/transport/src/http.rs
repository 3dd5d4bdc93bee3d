//! HTTP messenger for Graph-style send APIs
//!
//! Each message is posted as
//! `{"messaging_type": "RESPONSE", "recipient": {"id": ...}, "message": {"text": ..., "quick_replies": [...]}}`
//! with the page access token passed as the `access_token` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use chat_agent_core::{Messenger, MessagingError, OutgoingMessage, QuickReply};
use reqwest::{Client, Url};
use serde::Serialize;

use crate::TransportError;

#[derive(Debug, Clone)]
pub struct HttpMessengerConfig {
    /// Send API URL
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messaging_type: &'static str,
    recipient: Recipient<'a>,
    message: MessageBody<'a>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "<[QuickReply]>::is_empty")]
    quick_replies: &'a [QuickReply],
}

impl<'a> SendRequest<'a> {
    fn new(conversation_id: &'a str, message: &'a OutgoingMessage) -> Self {
        Self {
            messaging_type: "RESPONSE",
            recipient: Recipient {
                id: conversation_id,
            },
            message: MessageBody {
                text: &message.text,
                quick_replies: &message.quick_replies,
            },
        }
    }
}

/// Messenger posting to a remote send API with reqwest
pub struct HttpMessenger {
    client: Client,
    url: Url,
}

impl HttpMessenger {
    pub fn new(config: HttpMessengerConfig) -> Result<Self, TransportError> {
        let mut url = Url::parse(&config.endpoint)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if let Some(token) = &config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, url })
    }

    fn map_send_error(error: reqwest::Error) -> MessagingError {
        if error.is_timeout() {
            MessagingError::Timeout
        } else {
            MessagingError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), MessagingError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&SendRequest::new(conversation_id, message))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(conversation_id, status = status.as_u16(), "Message delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // 5xx errors are retryable, 4xx are not
        if status.is_server_error() {
            Err(MessagingError::Remote {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(MessagingError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned response and hand back the raw request
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (format!("http://{}/v2.6/me/messages", addr), handle)
    }

    fn messenger(endpoint: String) -> HttpMessenger {
        HttpMessenger::new(HttpMessengerConfig {
            endpoint,
            access_token: Some("secret".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let message = OutgoingMessage::text("¿Cómo te sientes hoy?")
            .with_quick_replies(vec![QuickReply::text("😀", "me siento muy bien")]);
        let json = serde_json::to_value(SendRequest::new("1234", &message)).unwrap();

        assert_eq!(json["messaging_type"], "RESPONSE");
        assert_eq!(json["recipient"]["id"], "1234");
        assert_eq!(json["message"]["text"], "¿Cómo te sientes hoy?");
        assert_eq!(json["message"]["quick_replies"][0]["content_type"], "text");
        assert_eq!(json["message"]["quick_replies"][0]["payload"], "me siento muy bien");
    }

    #[test]
    fn test_payload_omits_empty_quick_replies() {
        let message = OutgoingMessage::text("hola");
        let json = serde_json::to_value(SendRequest::new("1", &message)).unwrap();
        assert!(json["message"].get("quick_replies").is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = HttpMessenger::new(HttpMessengerConfig {
            endpoint: "ftp://example.com/send".to_string(),
            access_token: None,
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(result, Err(TransportError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_send_success_includes_token() {
        let (endpoint, server) = serve_once("200 OK", r#"{"message_id":"m1"}"#).await;
        let messenger = messenger(endpoint);

        messenger
            .send("42", &OutgoingMessage::text("hola"))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v2.6/me/messages?access_token=secret"));
        assert!(request.contains(r#""recipient":{"id":"42"}"#));
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let (endpoint, server) = serve_once("400 Bad Request", r#"{"error":"bad recipient"}"#).await;
        let messenger = messenger(endpoint);

        let err = messenger
            .send("42", &OutgoingMessage::text("hola"))
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            MessagingError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("bad recipient"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let (endpoint, server) = serve_once("503 Service Unavailable", "{}").await;
        let messenger = messenger(endpoint);

        let err = messenger
            .send("42", &OutgoingMessage::text("hola"))
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, MessagingError::Remote { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let messenger = messenger(format!("http://{}/send", addr));
        let err = messenger
            .send("42", &OutgoingMessage::text("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Transport(_)));
    }
}
