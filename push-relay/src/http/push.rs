//! Push endpoint: the RPC boundary.
//!
//! `POST /v1/push` takes a MessagePack [`PushToInput`] and answers with a
//! MessagePack [`PushToOutput`] or [`PushFailure`].

use crate::server::PushRelay;
use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use push_types::{ErrorKind, PushFailure, PushToInput, PushToOutput, MSGPACK_CONTENT_TYPE};
use std::sync::Arc;

/// HTTP status for a failure category.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnknownDestination | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::UnknownProvider => StatusCode::NOT_FOUND,
        ErrorKind::Provider => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Push batch handler.
pub async fn push_handler(Extension(relay): Extension<Arc<PushRelay>>, body: Bytes) -> Response {
    let input = match PushToInput::from_bytes(&body) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!("Rejecting undecodable push request: {}", e);
            relay.metrics().record_failure(ErrorKind::InvalidRequest);
            return failure(PushFailure::new(ErrorKind::InvalidRequest, e.to_string()));
        }
    };

    match relay.push_to(&input).await {
        Ok(delivered) => msgpack(StatusCode::OK, PushToOutput { delivered }.to_bytes()),
        Err(e) => failure(PushFailure::new(e.kind(), e.to_string())),
    }
}

fn failure(failure: PushFailure) -> Response {
    msgpack(status_for(failure.kind), failure.to_bytes())
}

fn msgpack(status: StatusCode, body: Result<Vec<u8>, push_types::TypesError>) -> Response {
    match body {
        Ok(bytes) => (status, [(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize reply: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(ErrorKind::UnknownDestination), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::UnknownProvider), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Provider), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
