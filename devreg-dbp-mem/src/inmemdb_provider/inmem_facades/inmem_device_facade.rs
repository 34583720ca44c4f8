/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Ephemeral in-memory implementation of [DeviceFacade].

use crate::InMemoryDatabaseProvider;
use devreg_dbp::dbp::facades::DeviceFacade;
use devreg_dbp::registry::Device;
use devreg_dbp::registry::DevicesPage;
use devreg_dbp::registry::RegistryError;
use devreg_dbp::registry::RegistryErrorKind;
use std::sync::Arc;

/// Ephemeral in-memory implementation of [DeviceFacade].
pub struct InMemDeviceFacade {
    inmem_provider: Arc<InMemoryDatabaseProvider>,
}

impl InMemDeviceFacade {
    /// Return a new instance.
    pub fn new(inmem_provider: &Arc<InMemoryDatabaseProvider>) -> Self {
        Self {
            inmem_provider: Arc::clone(inmem_provider),
        }
    }

    /// Return the device if it exists and belongs to the `owner`.
    fn owned_device(&self, owner: &str, id: &str) -> Result<Device, RegistryError> {
        self.inmem_provider
            .devices
            .get(id)
            .map(|entry| entry.value().clone())
            .filter(|device| device.owner == owner)
            .ok_or_else(|| {
                RegistryErrorKind::NotFound.error_with_msg(format!("No device with id '{id}'."))
            })
    }

    /// Map the `key` to the device `id` unless it is already in use by
    /// another device.
    fn claim_key(&self, key: &str, id: &str) -> Result<(), RegistryError> {
        let entry = self
            .inmem_provider
            .device_ids_by_key
            .get_or_insert_with(key.to_owned(), || id.to_owned());
        if entry.value() != id {
            Err(RegistryErrorKind::Conflict.error_with_msg("Key is already in use."))?;
        }
        Ok(())
    }

    /// Drop the `key` mapping if it still points to the device `id`.
    fn release_key(&self, key: &str, id: &str) {
        if let Some(entry) = self.inmem_provider.device_ids_by_key.get(key) {
            if entry.value() == id {
                entry.remove();
            }
        }
    }
}

#[async_trait::async_trait]
impl DeviceFacade for InMemDeviceFacade {
    async fn save(&self, device: Device) -> Result<String, RegistryError> {
        if device.id.is_empty() || device.key.is_empty() {
            Err(RegistryErrorKind::MalformedEntity
                .error_with_msg("Device must have both an identifier and a key."))?;
        }
        let id = device.id.to_owned();
        self.claim_key(&device.key, &id)?;
        let entry = self
            .inmem_provider
            .devices
            .get_or_insert_with(id.to_owned(), || device.clone());
        if entry.value() != &device {
            if entry.value().key != device.key {
                self.release_key(&device.key, &id);
            }
            Err(RegistryErrorKind::Conflict
                .error_with_msg(format!("Device '{id}' already exists.")))?;
        }
        Ok(id)
    }

    async fn update(&self, device: Device) -> Result<(), RegistryError> {
        let existing = self.owned_device(&device.owner, &device.id)?;
        let updated = Device {
            key: existing.key,
            ..device
        };
        self.inmem_provider
            .devices
            .insert(updated.id.to_owned(), updated);
        Ok(())
    }

    async fn update_key(&self, owner: &str, id: &str, key: &str) -> Result<(), RegistryError> {
        if key.is_empty() {
            Err(RegistryErrorKind::MalformedEntity.error_with_msg("Key must not be empty."))?;
        }
        let existing = self.owned_device(owner, id)?;
        self.claim_key(key, id)?;
        if existing.key != key {
            self.release_key(&existing.key, id);
        }
        let updated = Device {
            key: key.to_owned(),
            ..existing
        };
        self.inmem_provider.devices.insert(id.to_owned(), updated);
        Ok(())
    }

    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Device, RegistryError> {
        self.owned_device(owner, id)
    }

    async fn retrieve_by_key(&self, key: &str) -> Result<String, RegistryError> {
        self.inmem_provider
            .device_ids_by_key
            .get(key)
            .map(|entry| entry.value().to_owned())
            .ok_or_else(|| RegistryErrorKind::NotFound.error_with_msg("No device with this key."))
    }

    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<DevicesPage, RegistryError> {
        let matches = self
            .inmem_provider
            .devices
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|device| {
                device.owner == owner
                    && InMemoryDatabaseProvider::name_matches(name, &device.name)
            });
        let (page, devices) = InMemoryDatabaseProvider::page_of(matches, offset, limit, name);
        Ok(DevicesPage { page, devices })
    }

    async fn retrieve_by_channel(
        &self,
        owner: &str,
        channel_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DevicesPage, RegistryError> {
        let matches = self
            .inmem_provider
            .connected_device_ids(channel_id)
            .into_iter()
            .filter_map(|device_id| self.owned_device(owner, &device_id).ok());
        let (page, devices) = InMemoryDatabaseProvider::page_of(matches, offset, limit, None);
        Ok(DevicesPage { page, devices })
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError> {
        let Ok(existing) = self.owned_device(owner, id) else {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("Device '{id}' of '{owner}' was already gone.");
            }
            return Ok(());
        };
        for channel_id in self.inmem_provider.connected_channel_ids(id) {
            self.inmem_provider.remove_connection(&channel_id, id);
        }
        self.release_key(&existing.key, id);
        self.inmem_provider.devices.remove(id);
        Ok(())
    }
}
