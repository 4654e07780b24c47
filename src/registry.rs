use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service {0} is already registered")]
    DuplicateRegistration(&'static str),

    #[error("service {0} is not registered")]
    NotRegistered(&'static str),
}

struct Entry {
    name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Container of singleton services keyed by their concrete type.
///
/// Populated through `&mut self` during startup, then only read. Lookups
/// hand out `Arc`s to the stored instances and need no locking.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Entry>,
    order: Vec<&'static str>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `service` as the single instance of its type
    pub fn register<T: Send + Sync + 'static>(&mut self, service: T) -> Result<(), RegistryError> {
        let key = TypeId::of::<T>();
        let name = type_name::<T>();

        if self.services.contains_key(&key) {
            return Err(RegistryError::DuplicateRegistration(name));
        }

        self.services.insert(
            key,
            Entry {
                name,
                instance: Arc::new(service),
            },
        );
        self.order.push(name);
        tracing::debug!(service = name, "Registered service");
        Ok(())
    }

    /// Shared handle to the registered instance of `T`
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        let name = type_name::<T>();
        let entry = self
            .services
            .get(&TypeId::of::<T>())
            .ok_or(RegistryError::NotRegistered(name))?;

        entry
            .instance
            .clone()
            .downcast::<T>()
            .map_err(|_| RegistryError::NotRegistered(entry.name))
    }

    /// Type names in registration order
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.order)
            .finish()
    }
}
