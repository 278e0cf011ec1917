//! Provider lookup by system name

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::record::ExportEntityType;

use super::{
    ExportProvider, ProductXlsxExportProvider, ProviderDescriptor, SubscriberCsvExportProvider,
    XmlExportProvider,
};

/// Registry of export providers
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ExportProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    ///
    /// # Arguments
    /// * `provider` - Provider to add
    ///
    /// # Returns
    /// * `Result<()>` - Error if the system name is taken
    pub fn register<P: ExportProvider + 'static>(&mut self, provider: P) -> Result<()> {
        let system_name = provider.descriptor().system_name.clone();

        if self.providers.contains_key(&system_name) {
            return Err(ProviderError::AlreadyRegistered(system_name).into());
        }

        debug!("Registered export provider {}", system_name);
        self.providers.insert(system_name, Arc::new(provider));
        Ok(())
    }

    /// Look up a provider by system name
    pub fn get(&self, system_name: &str) -> Result<Arc<dyn ExportProvider>> {
        self.providers
            .get(system_name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(system_name.to_string()).into())
    }

    /// Descriptors of all providers, sorted by system name
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<_> = self
            .providers
            .values()
            .map(|p| p.descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.system_name.cmp(&b.system_name));
        descriptors
    }

    pub fn supports(&self, system_name: &str) -> bool {
        self.providers.contains_key(system_name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Registry holding every built-in provider
pub fn default_registry() -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();

    for entity_type in ExportEntityType::ALL {
        registry.register(XmlExportProvider::new(entity_type))?;
    }
    registry.register(ProductXlsxExportProvider::new())?;
    registry.register(SubscriberCsvExportProvider::new())?;

    Ok(registry)
}
