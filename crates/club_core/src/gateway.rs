//! Contract for sending a finalized payload to the remote endpoint.
//!
//! Implementations wrap an opaque network call. They report the outcome and
//! nothing else: no navigation, no retries, no mutation of wizard state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::aggregate::SubmissionPayload;
use crate::error::SubmissionError;
use crate::session::AuthToken;

/// Envelope every endpoint answers with: `{ ok, data? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<Option<T>, SubmissionError> {
        if self.ok {
            Ok(self.data)
        } else {
            Err(SubmissionError::not_ok())
        }
    }
}

/// Successful submission, with whatever `data` the endpoint returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ack {
    pub data: Option<serde_json::Value>,
}

#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        token: &AuthToken,
    ) -> Result<Ack, SubmissionError>;
}

/// Map a raw HTTP answer onto the submission contract: non-2xx and
/// `ok: false` are failures, an unparsable body on 2xx is a failure too.
pub fn interpret(status: u16, body: &str) -> Result<Ack, SubmissionError> {
    if !(200..300).contains(&status) {
        return Err(SubmissionError::rejected(status));
    }
    let response: ApiResponse<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| SubmissionError::new(format!("unreadable response: {e}")))?;
    let data = response.into_result()?;
    Ok(Ack { data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_status_is_rejected() {
        assert_eq!(
            interpret(500, r#"{"ok":true}"#),
            Err(SubmissionError::rejected(500))
        );
    }

    #[test]
    fn ok_false_is_a_failure() {
        assert_eq!(
            interpret(200, r#"{"ok":false}"#),
            Err(SubmissionError::not_ok())
        );
    }

    #[test]
    fn ok_true_carries_data() {
        let ack = interpret(201, r#"{"ok":true,"data":{"id":3}}"#).unwrap();
        assert_eq!(ack.data, Some(serde_json::json!({"id": 3})));
        assert_eq!(interpret(200, r#"{"ok":true}"#), Ok(Ack::default()));
    }

    #[test]
    fn garbage_body_is_a_failure() {
        assert!(interpret(200, "<html>").is_err());
    }
}
