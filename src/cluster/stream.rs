// ABOUTME: REST client for the streaming broker behind a deployed stream variant.
// ABOUTME: Topics, consumer lifecycle, and producer publish over HTTP.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

const KAFKA_JSON: &str = "application/vnd.kafka.json.v2+json";
const KAFKA_ACCEPT: &str = "application/vnd.kafka.v2+json";

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid stream request: {0}")]
    InvalidRequest(String),

    #[error("stream broker request failed: {0}")]
    Http(String),

    #[error("stream broker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream broker request timed out after {0:?}")]
    Timeout(Duration),
}

/// Compose the stream URL for a deployed stream variant:
/// `http://{cluster-service}/stream/{name}/{tag}`.
pub fn stream_url(service_endpoint: &str, model_name: &str, model_tag: &str) -> String {
    format!(
        "http://{}/stream/{}/{}",
        service_endpoint.trim_end_matches('/'),
        model_name,
        model_tag
    )
}

/// HTTP client for the broker's REST proxy.
pub struct StreamHttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl StreamHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        content_type: Option<&str>,
        accept: Option<&str>,
        body: Option<String>,
    ) -> Result<String, StreamError> {
        let mut builder = Request::builder().method(method).uri(url);
        if let Some(ct) = content_type {
            builder = builder.header("Content-Type", ct);
        }
        if let Some(accept) = accept {
            builder = builder.header("Accept", accept);
        }
        let body = Full::new(Bytes::from(body.unwrap_or_default()));
        let request = builder
            .body(body)
            .map_err(|e| StreamError::InvalidRequest(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| StreamError::Timeout(self.timeout))?
            .map_err(|e| StreamError::Http(e.to_string()))?;

        let status = response.status();
        let bytes = tokio::time::timeout(self.timeout, response.into_body().collect())
            .await
            .map_err(|_| StreamError::Timeout(self.timeout))?
            .map_err(|e| StreamError::Http(e.to_string()))?
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes).to_string();

        if !status.is_success() {
            return Err(StreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// List the broker's topics.
    pub async fn topics(&self, stream_url: &str) -> Result<String, StreamError> {
        let url = format!("{}/topics", stream_url.trim_end_matches('/'));
        self.request(Method::GET, &url, None, Some(KAFKA_ACCEPT), None)
            .await
    }

    /// Describe one topic.
    pub async fn describe_topic(
        &self,
        stream_url: &str,
        topic: &str,
    ) -> Result<String, StreamError> {
        let url = format!(
            "{}/topics/{}",
            stream_url.trim_end_matches('/'),
            urlencoding::encode(topic)
        );
        self.request(Method::GET, &url, None, Some(KAFKA_ACCEPT), None)
            .await
    }

    /// Consume pending records from a topic: register a consumer, subscribe
    /// it, fetch records, then delete the consumer instance. The consumer
    /// name defaults to the topic name.
    pub async fn consume(
        &self,
        stream_url: &str,
        topic: &str,
        consumer_name: Option<&str>,
        offset: &str,
    ) -> Result<String, StreamError> {
        let base = stream_url.trim_end_matches('/');
        let consumer = consumer_name.unwrap_or(topic);
        let consumer_enc = urlencoding::encode(consumer).into_owned();

        let register_url = format!("{base}/consumers/{consumer_enc}");
        let register_body = format!(
            "{{\"name\": \"{consumer}\", \"format\": \"json\", \"auto.offset.reset\": \"{offset}\"}}"
        );
        self.request(
            Method::POST,
            &register_url,
            Some(KAFKA_JSON),
            None,
            Some(register_body),
        )
        .await?;

        let subscribe_url =
            format!("{base}/consumers/{consumer_enc}/instances/{consumer_enc}/subscription");
        let subscribe_body = format!("{{\"topics\": [\"{topic}\"]}}");
        self.request(
            Method::POST,
            &subscribe_url,
            Some(KAFKA_JSON),
            None,
            Some(subscribe_body),
        )
        .await?;

        let records_url = format!("{base}/consumers/{consumer_enc}/instances/{consumer_enc}/records");
        let records = self
            .request(Method::GET, &records_url, None, Some(KAFKA_JSON), None)
            .await?;

        // Best effort: a leaked consumer instance expires on the broker side.
        let delete_url = format!("{base}/consumers/{consumer_enc}/instances/{consumer_enc}");
        let _ = self
            .request(Method::DELETE, &delete_url, Some(KAFKA_JSON), None, None)
            .await;

        Ok(records)
    }

    /// Publish one JSON payload as a record on a topic.
    pub async fn produce(
        &self,
        stream_url: &str,
        topic: &str,
        payload: &str,
    ) -> Result<String, StreamError> {
        let url = format!(
            "{}/topics/{}",
            stream_url.trim_end_matches('/'),
            urlencoding::encode(topic)
        );
        let body = format!("{{\"records\": [{{\"value\":{payload}}}]}}");
        self.request(
            Method::POST,
            &url,
            Some(KAFKA_JSON),
            Some(KAFKA_ACCEPT),
            Some(body),
        )
        .await
    }
}
