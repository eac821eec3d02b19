//! Send a push through a relay.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use push_types::{Priority, PushData, PushFailure, PushToInput, PushToOutput, MSGPACK_CONTENT_TYPE};
use reqwest::header::CONTENT_TYPE;

/// Run the send command.
pub async fn run(
    relay: &str,
    identifier: &str,
    envelope: Vec<u8>,
    high_priority: bool,
) -> Result<()> {
    let priority = if high_priority {
        Priority::High
    } else {
        Priority::Normal
    };
    let identifier = STANDARD
        .decode(identifier.trim())
        .context("Identifier is not valid base64")?;
    let data = PushData::new(identifier, envelope).with_priority(priority);

    println!("Sending {} byte envelope via {}...", data.envelope.len(), relay);
    let input = PushToInput {
        push_data: vec![data],
    };
    let delivered = deliver(relay, &input).await?;
    println!("Delivered {} push(es)", delivered);

    Ok(())
}

/// POST a batch to the relay and decode its reply.
pub async fn deliver(relay: &str, input: &PushToInput) -> Result<u32> {
    let url = format!("{}/v1/push", relay.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
        .body(input.to_bytes()?)
        .send()
        .await
        .with_context(|| format!("Failed to reach relay at {url}"))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .context("Failed to read relay response")?;

    if status.is_success() {
        return Ok(PushToOutput::from_bytes(&body)?.delivered);
    }

    match PushFailure::from_bytes(&body) {
        Ok(failure) => anyhow::bail!("Relay rejected push ({}): {}", failure.kind, failure.message),
        Err(_) => anyhow::bail!("Relay returned status {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use push_types::ErrorKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn batch() -> PushToInput {
        PushToInput {
            push_data: vec![PushData::new(vec![1, 2, 3], b"envelope".to_vec())],
        }
    }

    #[tokio::test]
    async fn deliver_returns_delivered_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/push"))
            .and(header("content-type", MSGPACK_CONTENT_TYPE))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PushToOutput { delivered: 1 }.to_bytes().unwrap()),
            )
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(deliver(&server.uri(), &batch()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deliver_surfaces_relay_failure() {
        let server = MockServer::start().await;
        let failure = PushFailure::new(ErrorKind::UnknownProvider, "unknown push type");
        Mock::given(method("POST"))
            .and(path("/v1/push"))
            .respond_with(ResponseTemplate::new(404).set_body_bytes(failure.to_bytes().unwrap()))
            .mount(&server)
            .await;

        let err = deliver(&format!("{}/", server.uri()), &batch())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown_provider"));
        assert!(message.contains("unknown push type"));
    }

    #[tokio::test]
    async fn deliver_reports_status_for_opaque_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = deliver(&server.uri(), &batch()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn run_rejects_malformed_identifier() {
        let server = MockServer::start().await;
        let result = run(&server.uri(), "not base64!", b"env".to_vec(), false).await;

        assert!(result.is_err());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
