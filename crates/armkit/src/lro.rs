//! Long-running operation status handling.
//!
//! Resource Manager reports the progress of an asynchronous operation in one
//! of three places: the `Azure-AsyncOperation` status resource, a `Location`
//! URL that answers 202 until the work is done, or the resource's own
//! `properties.provisioningState`. This module interprets those documents;
//! the polling loop lives in [`ArmClient`](crate::ArmClient).

use crate::error::Error;
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};

/// State of an operation at one poll
#[derive(Debug)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    /// `Failed` or `Canceled`, with the error to report
    Failed(Error),
}

impl OperationStatus {
    /// Interpret an `Azure-AsyncOperation` status document
    pub fn from_async_operation(body: &Value) -> Self {
        let status = body.get("status").and_then(Value::as_str).unwrap_or("");
        Self::from_state(status, body)
    }

    /// Interpret a resource body by its `properties.provisioningState`
    ///
    /// A body with no provisioning state is treated as finished.
    pub fn from_resource(body: &Value) -> Self {
        match provisioning_state(body) {
            Some(state) => Self::from_state(state, body),
            None => Self::Succeeded,
        }
    }

    fn from_state(state: &str, body: &Value) -> Self {
        if state.eq_ignore_ascii_case("Succeeded") {
            Self::Succeeded
        } else if state.eq_ignore_ascii_case("Failed") {
            Self::Failed(operation_error(body, "OperationFailed"))
        } else if state.eq_ignore_ascii_case("Canceled") {
            Self::Failed(operation_error(body, "OperationCanceled"))
        } else {
            Self::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

pub fn provisioning_state(body: &Value) -> Option<&str> {
    body.get("properties")?
        .get("provisioningState")?
        .as_str()
}

/// Error carried by a failed operation document, or a generic one
fn operation_error(body: &Value, default_code: &str) -> Error {
    match body.get("error") {
        Some(error) if error.is_object() => Error::from_body(200, error),
        _ => Error::Service {
            status: 200,
            code: default_code.to_string(),
            message: "the long-running operation did not succeed".to_string(),
        },
    }
}

/// Bounds the total time spent waiting on one operation
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    max_wait: Duration,
    poll_interval: Duration,
}

impl Deadline {
    pub fn start(max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            max_wait,
            poll_interval,
        }
    }

    /// Sleep before the next poll, or fail if the wait would overrun
    ///
    /// `retry_after` from the service takes precedence over the configured
    /// interval.
    pub fn pause(&self, operation: &str, retry_after: Option<Duration>) -> Result<(), Error> {
        let delay = retry_after.unwrap_or(self.poll_interval);
        let resume_at = self.started.elapsed().checked_add(delay);
        if resume_at.is_none_or(|at| at > self.max_wait) {
            return Err(Error::Timeout(format!(
                "{operation} did not finish within {}s",
                self.max_wait.as_secs()
            )));
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::{ErrorCategory, ProviderError};
    use serde_json::json;

    #[test]
    fn test_async_operation_states() {
        assert!(matches!(
            OperationStatus::from_async_operation(&json!({"status": "InProgress"})),
            OperationStatus::InProgress
        ));
        assert!(matches!(
            OperationStatus::from_async_operation(&json!({"status": "Succeeded"})),
            OperationStatus::Succeeded
        ));
    }

    #[test]
    fn test_failed_operation_carries_error() {
        let body = json!({
            "status": "Failed",
            "error": {"code": "AllocationFailed", "message": "no capacity in eastus"}
        });
        let OperationStatus::Failed(err) = OperationStatus::from_async_operation(&body) else {
            panic!("expected failure");
        };
        let err: ProviderError = err.into();
        assert_eq!(err.code, "AllocationFailed");
        assert_eq!(err.category, ErrorCategory::Quota);
    }

    #[test]
    fn test_canceled_without_error_body() {
        let OperationStatus::Failed(err) =
            OperationStatus::from_async_operation(&json!({"status": "Canceled"}))
        else {
            panic!("expected failure");
        };
        let err: ProviderError = err.into();
        assert_eq!(err.code, "OperationCanceled");
    }

    #[test]
    fn test_resource_provisioning_state() {
        let updating = json!({"properties": {"provisioningState": "Updating"}});
        assert_eq!(provisioning_state(&updating), Some("Updating"));
        assert!(!OperationStatus::from_resource(&updating).is_terminal());

        let done = json!({"properties": {"provisioningState": "Succeeded"}});
        assert!(matches!(
            OperationStatus::from_resource(&done),
            OperationStatus::Succeeded
        ));

        // Resource groups created synchronously may carry no state at all
        assert!(OperationStatus::from_resource(&json!({"id": "/x"})).is_terminal());
    }

    #[test]
    fn test_deadline_expires() {
        let deadline = Deadline::start(Duration::ZERO, Duration::from_millis(1));
        let err = deadline.pause("create vm", None).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        let err: ProviderError = err.into();
        assert_eq!(err.category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_deadline_rejects_huge_retry_after() {
        let deadline = Deadline {
            started: Instant::now() - Duration::from_secs(2),
            max_wait: Duration::from_secs(1800),
            poll_interval: Duration::from_secs(5),
        };
        let err = deadline
            .pause("create vm", Some(Duration::from_secs(u64::MAX)))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn test_deadline_allows_zero_interval() {
        let deadline = Deadline::start(Duration::from_secs(1), Duration::ZERO);
        assert!(deadline.pause("create vm", None).is_ok());
    }
}
