use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{EntityRef, EnvironmentEntity, ServiceEntity, ServiceOverrideEntity};
use crate::{EntityStore, StoreError};

/// In-memory entity store.
///
/// Backing store for tests and the CLI's `--entities` seed file. Lookups
/// never fail; absent documents return `None` like any other backend.
#[derive(Default)]
pub struct InMemoryEntityStore {
  services: Mutex<HashMap<EntityRef, ServiceEntity>>,
  environments: Mutex<HashMap<EntityRef, EnvironmentEntity>>,
  service_overrides: Mutex<HashMap<(EntityRef, String), ServiceOverrideEntity>>,
}

impl InMemoryEntityStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn put_service(&self, entity_ref: EntityRef, entity: ServiceEntity) {
    self.services.lock().unwrap().insert(entity_ref, entity);
  }

  pub fn put_environment(&self, entity_ref: EntityRef, entity: EnvironmentEntity) {
    self.environments.lock().unwrap().insert(entity_ref, entity);
  }

  pub fn put_service_override(
    &self,
    environment_ref: EntityRef,
    service_identifier: impl Into<String>,
    entity: ServiceOverrideEntity,
  ) {
    self
      .service_overrides
      .lock()
      .unwrap()
      .insert((environment_ref, service_identifier.into()), entity);
  }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
  async fn get_service(
    &self,
    entity_ref: &EntityRef,
  ) -> Result<Option<ServiceEntity>, StoreError> {
    Ok(self.services.lock().unwrap().get(entity_ref).cloned())
  }

  async fn get_environment(
    &self,
    entity_ref: &EntityRef,
  ) -> Result<Option<EnvironmentEntity>, StoreError> {
    Ok(self.environments.lock().unwrap().get(entity_ref).cloned())
  }

  async fn get_service_override(
    &self,
    environment_ref: &EntityRef,
    service_identifier: &str,
  ) -> Result<Option<ServiceOverrideEntity>, StoreError> {
    let key = (environment_ref.clone(), service_identifier.to_string());
    Ok(self.service_overrides.lock().unwrap().get(&key).cloned())
  }
}
