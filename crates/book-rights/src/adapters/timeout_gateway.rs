//! Timeout Gateway
//!
//! Decorates any `RegistryGateway` with a per-call deadline. An elapsed
//! deadline surfaces as `NetworkError`; the abandoned call is dropped, never
//! retried.

use crate::domain::{
    AuthorizationSignature, BookRightsError, DecryptedFields, DecryptionRequestPayload,
    EncryptedRecord, RegisteredBook,
};
use crate::ports::outbound::RegistryGateway;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Registry gateway with a deadline on every call.
#[derive(Debug)]
pub struct TimeoutGateway<G> {
    inner: G,
    deadline: Duration,
}

impl<G: RegistryGateway> TimeoutGateway<G> {
    /// Wrap `inner`, bounding each call by `deadline`.
    pub fn new(inner: G, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// Wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Deadline in whole milliseconds, saturating at `u64::MAX`.
    fn deadline_ms(&self) -> u64 {
        u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX)
    }

    async fn bounded<T: Send>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, BookRightsError>> + Send,
    ) -> Result<T, BookRightsError> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    deadline_ms = self.deadline_ms(),
                    "[book-rights] Registry call timed out"
                );
                Err(BookRightsError::NetworkError(format!(
                    "{} timed out after {}ms",
                    operation,
                    self.deadline_ms()
                )))
            }
        }
    }
}

#[async_trait]
impl<G: RegistryGateway> RegistryGateway for TimeoutGateway<G> {
    async fn submit_registration(
        &self,
        record: &EncryptedRecord,
        signature: &AuthorizationSignature,
    ) -> Result<RegisteredBook, BookRightsError> {
        self.bounded(
            "submit_registration",
            self.inner.submit_registration(record, signature),
        )
        .await
    }

    async fn submit_decryption_request(
        &self,
        request: &DecryptionRequestPayload,
        signature: &AuthorizationSignature,
    ) -> Result<DecryptedFields, BookRightsError> {
        self.bounded(
            "submit_decryption_request",
            self.inner.submit_decryption_request(request, signature),
        )
        .await
    }

    async fn query_records(&self) -> Result<Vec<RegisteredBook>, BookRightsError> {
        self.bounded("query_records", self.inner.query_records())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRegistry;

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let gateway = TimeoutGateway::new(InMemoryRegistry::new(), Duration::from_secs(5));
        let records = gateway.query_records().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_slow_call_becomes_network_error() {
        let registry = InMemoryRegistry::new().with_latency(Duration::from_millis(200));
        let gateway = TimeoutGateway::new(registry, Duration::from_millis(10));

        let err = gateway.query_records().await.unwrap_err();
        assert!(
            matches!(err, BookRightsError::NetworkError(ref msg) if msg.contains("query_records"))
        );
        assert!(err.kind().is_retryable());
    }

    #[tokio::test]
    async fn test_oversized_deadline_saturates() {
        let gateway = TimeoutGateway::new(InMemoryRegistry::new(), Duration::MAX);
        assert_eq!(gateway.deadline_ms(), u64::MAX);

        let gateway = TimeoutGateway::new(InMemoryRegistry::new(), Duration::from_millis(1500));
        assert_eq!(gateway.deadline_ms(), 1500);

        // Far-future deadline still lets calls through
        let slow = TimeoutGateway::new(
            InMemoryRegistry::new().with_latency(Duration::from_millis(5)),
            Duration::MAX,
        );
        assert!(slow.query_records().await.unwrap().is_empty());
    }
}
