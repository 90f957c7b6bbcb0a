//! Larkspur Entity Store
//!
//! This crate provides the storage trait and an in-memory implementation
//! for the entities the compiler looks up while resolving a stage: service
//! documents, environment documents (with their global overrides and named
//! override sets), and per-service-per-environment override documents.
//!
//! The [`EntityStore`] trait is the seam to the real document store; the
//! compiler only ever talks to it through [`StoreClient`], which bounds
//! every lookup with a single timeout and a cancellation check. Retry and
//! backoff belong to the backing client, not here.

mod client;
mod memory;
mod types;

pub use client::StoreClient;
pub use memory::InMemoryEntityStore;
pub use types::{EntityRef, EnvironmentEntity, ServiceEntity, ServiceOverrideEntity};

use async_trait::async_trait;

/// Error type for entity lookups.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The backing store failed.
  #[error("entity store error: {0}")]
  Backend(String),

  /// The lookup did not complete within the configured bound.
  #[error("entity lookup for '{identifier}' timed out")]
  Timeout { identifier: String },

  /// The compilation was cancelled while a lookup was in flight.
  #[error("entity lookup cancelled")]
  Cancelled,
}

/// Storage trait for the entities referenced from pipeline documents.
#[async_trait]
pub trait EntityStore: Send + Sync {
  /// Fetch a service document.
  async fn get_service(&self, entity_ref: &EntityRef)
  -> Result<Option<ServiceEntity>, StoreError>;

  /// Fetch an environment document.
  async fn get_environment(
    &self,
    entity_ref: &EntityRef,
  ) -> Result<Option<EnvironmentEntity>, StoreError>;

  /// Fetch the override document for a service within an environment.
  async fn get_service_override(
    &self,
    environment_ref: &EntityRef,
    service_identifier: &str,
  ) -> Result<Option<ServiceOverrideEntity>, StoreError>;
}
