//! # Message Delivery Transport
//!
//! One remote call per invocation: send a JSON body for a named operation and
//! return the decoded JSON response. [`HttpTransport`] speaks the service's
//! JSON-over-HTTP protocol with `reqwest`.

use super::errors::{MessagingError, MessagingResult, TransportError};
use crate::config::MessageDeliveryConfig;
use crate::constants::delivery;
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn call(
        &self,
        operation: &'static str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}

/// HTTP transport for the message delivery service
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &MessageDeliveryConfig) -> MessagingResult<Self> {
        let endpoint = config.service_endpoint().ok_or_else(|| {
            MessagingError::configuration(
                "http_transport",
                "Neither an endpoint nor a region is configured",
            )
        })?;
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            MessagingError::configuration(
                "http_transport",
                format!("Invalid endpoint '{endpoint}': {e}"),
            )
        })?;

        // Dial and overall timeouts both come from the connection timeout
        let timeout = config.connection_timeout();
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                MessagingError::configuration(
                    "http_transport",
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;

        info!(
            endpoint = %endpoint,
            timeout_ms = config.connection_timeout_ms,
            "Created message delivery HTTP transport"
        );

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn call(
        &self,
        operation: &'static str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let target = format!("{}.{}", delivery::SERVICE_TARGET_PREFIX, operation);
        debug!(url = %self.endpoint, target = %target, "Sending message delivery request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, delivery::CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::request(error_chain(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::request(error_chain(&e)))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Render an error with its full `source()` chain.
///
/// Classification markers such as "connection reset by peer" usually live in
/// an inner IO error rather than the outermost message.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !rendered.contains(&inner_text) {
            rendered.push_str(": ");
            rendered.push_str(&inner_text);
        }
        source = inner.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert_eq!(
            error_chain(&err),
            "error sending request: connection reset by peer"
        );
    }

    #[test]
    fn test_new_rejects_invalid_endpoint() {
        let config = MessageDeliveryConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(MessagingError::Configuration { .. })
        ));
    }

    #[test]
    fn test_new_derives_endpoint_from_region() {
        let config = MessageDeliveryConfig {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint.host_str(),
            Some("ec2messages.us-east-1.amazonaws.com")
        );
        assert_eq!(transport.endpoint.scheme(), "https");
    }

    #[test]
    fn test_new_rejects_missing_endpoint_and_region() {
        let err = HttpTransport::new(&MessageDeliveryConfig::default()).unwrap_err();
        assert!(matches!(err, MessagingError::Configuration { .. }));
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_new_accepts_https_endpoint() {
        let config = MessageDeliveryConfig {
            endpoint: "https://ec2messages.us-east-1.amazonaws.com".to_string(),
            ..Default::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }
}
