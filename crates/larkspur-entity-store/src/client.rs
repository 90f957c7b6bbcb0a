use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{EntityRef, EnvironmentEntity, ServiceEntity, ServiceOverrideEntity};
use crate::{EntityStore, StoreError};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client wrapper the compiler uses for every entity lookup.
///
/// Each lookup is bounded by a single timeout and aborts when the
/// compilation's cancellation token fires. There is no local retry; the
/// backing store client owns retry and backoff policy.
#[derive(Clone)]
pub struct StoreClient {
  store: Arc<dyn EntityStore>,
  timeout: Duration,
}

impl StoreClient {
  pub fn new(store: Arc<dyn EntityStore>) -> Self {
    Self {
      store,
      timeout: DEFAULT_LOOKUP_TIMEOUT,
    }
  }

  pub fn with_timeout(store: Arc<dyn EntityStore>, timeout: Duration) -> Self {
    Self { store, timeout }
  }

  pub async fn get_service(
    &self,
    entity_ref: &EntityRef,
    cancel: &CancellationToken,
  ) -> Result<Option<ServiceEntity>, StoreError> {
    self
      .bounded(&entity_ref.identifier, cancel, self.store.get_service(entity_ref))
      .await
  }

  pub async fn get_environment(
    &self,
    entity_ref: &EntityRef,
    cancel: &CancellationToken,
  ) -> Result<Option<EnvironmentEntity>, StoreError> {
    self
      .bounded(
        &entity_ref.identifier,
        cancel,
        self.store.get_environment(entity_ref),
      )
      .await
  }

  pub async fn get_service_override(
    &self,
    environment_ref: &EntityRef,
    service_identifier: &str,
    cancel: &CancellationToken,
  ) -> Result<Option<ServiceOverrideEntity>, StoreError> {
    self
      .bounded(
        service_identifier,
        cancel,
        self.store.get_service_override(environment_ref, service_identifier),
      )
      .await
  }

  async fn bounded<T>(
    &self,
    identifier: &str,
    cancel: &CancellationToken,
    lookup: impl Future<Output = Result<T, StoreError>>,
  ) -> Result<T, StoreError> {
    if cancel.is_cancelled() {
      return Err(StoreError::Cancelled);
    }
    tokio::select! {
      _ = cancel.cancelled() => Err(StoreError::Cancelled),
      result = tokio::time::timeout(self.timeout, lookup) => match result {
        Ok(inner) => inner,
        Err(_) => Err(StoreError::Timeout {
          identifier: identifier.to_string(),
        }),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::InMemoryEntityStore;
  use async_trait::async_trait;

  /// Store whose lookups never complete.
  struct HangingStore;

  #[async_trait]
  impl EntityStore for HangingStore {
    async fn get_service(
      &self,
      _entity_ref: &EntityRef,
    ) -> Result<Option<ServiceEntity>, StoreError> {
      std::future::pending().await
    }

    async fn get_environment(
      &self,
      _entity_ref: &EntityRef,
    ) -> Result<Option<EnvironmentEntity>, StoreError> {
      std::future::pending().await
    }

    async fn get_service_override(
      &self,
      _environment_ref: &EntityRef,
      _service_identifier: &str,
    ) -> Result<Option<ServiceOverrideEntity>, StoreError> {
      std::future::pending().await
    }
  }

  #[tokio::test]
  async fn test_lookup_times_out() {
    let client = StoreClient::with_timeout(Arc::new(HangingStore), Duration::from_millis(20));
    let entity_ref = EntityRef::new("acc", "org", "proj", "svc1");

    let err = client
      .get_service(&entity_ref, &CancellationToken::new())
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Timeout { .. }));
  }

  #[tokio::test]
  async fn test_lookup_respects_cancellation() {
    let client = StoreClient::new(Arc::new(HangingStore));
    let entity_ref = EntityRef::new("acc", "org", "proj", "svc1");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get_service(&entity_ref, &cancel).await.unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
  }

  #[tokio::test]
  async fn test_missing_entity_is_none() {
    let client = StoreClient::new(Arc::new(InMemoryEntityStore::new()));
    let entity_ref = EntityRef::new("acc", "org", "proj", "absent");

    let found = client
      .get_service(&entity_ref, &CancellationToken::new())
      .await
      .unwrap();
    assert!(found.is_none());
  }
}
