use ::anyhow::{anyhow, Result};
use ::std::time::Duration;

use crate::model::{trailing_slashed, PostPayload, WireResponse};

pub const CREDENTIAL_HEADER: &str = "x-syndicate-key";
pub const RECEIVE_PATH: &str = "wire/receive";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const TEST_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound transport to peer sites. A trait so the dispatcher and receiver
/// can be exercised without a network.
#[::async_trait::async_trait]
pub trait WireClient: Send + Sync {
    /// Single delivery attempt. Transport failures, non-200 statuses and
    /// unparseable bodies are all Err; a parsed body is returned as-is, with
    /// the peer's own success flag intact.
    async fn send_post(
        &self,
        base_url: &str,
        credential: &str,
        payload: &PostPayload,
    ) -> Result<WireResponse>;

    /// Reachability probe. The peer answers a bare test payload with 400 by
    /// design, so 200 and 400 both count as reachable.
    async fn test_connection(&self, base_url: &str, credential: &str) -> Result<()>;

    /// Best-effort check that `url` serves an image, used before adopting a
    /// remote featured image.
    async fn fetch_image(&self, url: &str) -> Result<()>;
}

pub struct HttpWireClient {
    client: ::reqwest::Client,
}

impl HttpWireClient {
    pub fn new() -> Result<HttpWireClient> {
        Ok(HttpWireClient {
            client: ::reqwest::Client::builder().build()?,
        })
    }
}

fn receive_endpoint(base_url: &str) -> String {
    format!("{}{}", trailing_slashed(base_url), RECEIVE_PATH)
}

#[::async_trait::async_trait]
impl WireClient for HttpWireClient {
    async fn send_post(
        &self,
        base_url: &str,
        credential: &str,
        payload: &PostPayload,
    ) -> Result<WireResponse> {
        let response = self
            .client
            .post(receive_endpoint(base_url))
            .timeout(SEND_TIMEOUT)
            .header(CREDENTIAL_HEADER, credential)
            .json(payload)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<WireResponse>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "unknown error".to_string());

            return Err(anyhow!("peer returned {}: {}", status, message));
        }

        Ok(response.json::<WireResponse>().await?)
    }

    async fn test_connection(&self, base_url: &str, credential: &str) -> Result<()> {
        let payload = PostPayload {
            test: true,
            ..Default::default()
        };

        let response = self
            .client
            .post(receive_endpoint(base_url))
            .timeout(TEST_TIMEOUT)
            .header(CREDENTIAL_HEADER, credential)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();

        if status == ::reqwest::StatusCode::OK
            || status == ::reqwest::StatusCode::BAD_REQUEST
        {
            return Ok(());
        }

        Err(anyhow!("connection failed: peer returned {}", status))
    }

    async fn fetch_image(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .get(url)
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("image fetch returned {}", status));
        }

        let content_type = response
            .headers()
            .get(::reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("image/") {
            return Err(anyhow!("not an image: {}", content_type));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_built_on_the_slashed_base() {
        assert_eq!(
            receive_endpoint("https://b.test"),
            "https://b.test/wire/receive"
        );
        assert_eq!(
            receive_endpoint("https://b.test/"),
            "https://b.test/wire/receive"
        );
    }
}
