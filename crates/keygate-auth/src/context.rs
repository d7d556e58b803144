//! Per-request context handed to the coordinator by the transport.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::metadata::Metadata;
use crate::StoreError;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::thread_rng().gen();
        let id = format!(
            "{:x}-{}",
            chrono::Utc::now().timestamp_millis(),
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request context: identity, metadata and deadline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// Transport metadata, `None` when the transport delivered none.
    pub metadata: Option<Metadata>,
    /// Point after which store calls are abandoned.
    pub deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Create a context with no metadata and no deadline.
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
            metadata: None,
            deadline: None,
        }
    }

    /// Attach transport metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Use a specific request ID.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Run a store call under this request's deadline.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| StoreError::DeadlineExceeded)?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::generate();
        let id2 = RequestId::generate();
        assert_ne!(id1, id2);
        assert_eq!(RequestId::from_string("req-1").to_string(), "req-1");
    }

    #[test]
    fn test_new_context_has_no_metadata() {
        let ctx = RequestContext::new();
        assert!(ctx.metadata.is_none());
        assert!(ctx.deadline.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let result: Result<(), StoreError> = ctx
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_bounded_without_deadline() {
        let ctx = RequestContext::new();
        let value = ctx.bounded(async { Ok::<_, StoreError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
