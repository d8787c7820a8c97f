// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model identifier to device model lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::DeviceModel;
use crate::error::RegistryError;

/// Maps model identifiers (e.g. `SNSW-001X16EU`) to device models.
///
/// Identifiers are compared case-insensitively. One model may be
/// registered under several identifiers (hardware revisions, regional
/// variants), but an identifier can only be registered once.
///
/// # Examples
///
/// ```
/// use shelly_homekit::delegate::DelegateRegistry;
///
/// let registry = DelegateRegistry::with_builtin_models().unwrap();
/// assert!(registry.get("snsw-001x16eu").is_some());
/// assert!(registry.get("SHSW-1").is_none());
/// ```
#[derive(Default)]
pub struct DelegateRegistry {
    models: HashMap<String, Arc<dyn DeviceModel>>,
}

impl DelegateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every model this crate supports.
    ///
    /// # Errors
    ///
    /// Returns an error if two built-in models claim the same identifier.
    pub fn with_builtin_models() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::models::register_builtin(&mut registry)?;
        Ok(registry)
    }

    /// Registers `model` under every identifier in `ids`.
    ///
    /// Nothing is registered if any identifier is already taken.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModel`] naming the first identifier
    /// that is already registered or repeated in `ids`.
    pub fn register(&mut self, model: Arc<dyn DeviceModel>, ids: &[&str]) -> Result<(), RegistryError> {
        let mut keys: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let key = id.to_uppercase();
            if self.models.contains_key(&key) || keys.contains(&key) {
                return Err(RegistryError::DuplicateModel {
                    model: (*id).to_string(),
                });
            }
            keys.push(key);
        }

        for key in keys {
            self.models.insert(key, Arc::clone(&model));
        }
        Ok(())
    }

    /// The model registered for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn DeviceModel>> {
        self.models.get(&id.to_uppercase()).cloned()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(&id.to_uppercase())
    }

    /// Number of registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl std::fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.models.keys().collect();
        ids.sort();
        f.debug_struct("DelegateRegistry").field("models", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::DeviceDelegate;

    struct Nothing;

    impl DeviceModel for Nothing {
        fn setup(&self, _delegate: &DeviceDelegate) -> crate::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = DelegateRegistry::new();
        registry.register(Arc::new(Nothing), &["snsw-001x16eu"]).unwrap();

        assert!(registry.get("SNSW-001X16EU").is_some());
        assert!(registry.contains("Snsw-001X16eu"));
    }

    #[test]
    fn duplicate_registration_is_rejected_atomically() {
        let mut registry = DelegateRegistry::new();
        registry.register(Arc::new(Nothing), &["A"]).unwrap();

        let err = registry
            .register(Arc::new(Nothing), &["B", "a"])
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateModel {
                model: "a".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "a device delegate for a has already been registered"
        );
        assert!(!registry.contains("B"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_models_register_cleanly() {
        let registry = DelegateRegistry::with_builtin_models().unwrap();
        assert!(registry.contains("SNSN-0024X"));
        assert!(registry.contains("SPSW-004PE16EU"));
    }
}
