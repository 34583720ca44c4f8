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

//! Ephemeral in-memory implementation of [ChannelFacade].

use crate::InMemoryDatabaseProvider;
use devreg_dbp::dbp::facades::ChannelFacade;
use devreg_dbp::registry::Channel;
use devreg_dbp::registry::ChannelsPage;
use devreg_dbp::registry::RegistryError;
use devreg_dbp::registry::RegistryErrorKind;
use std::sync::Arc;

/// Ephemeral in-memory implementation of [ChannelFacade].
pub struct InMemChannelFacade {
    inmem_provider: Arc<InMemoryDatabaseProvider>,
}

impl InMemChannelFacade {
    /// Return a new instance.
    pub fn new(inmem_provider: &Arc<InMemoryDatabaseProvider>) -> Self {
        Self {
            inmem_provider: Arc::clone(inmem_provider),
        }
    }

    /// Return the channel if it exists and belongs to the `owner`.
    fn owned_channel(&self, owner: &str, id: &str) -> Result<Channel, RegistryError> {
        self.inmem_provider
            .channels
            .get(id)
            .map(|entry| entry.value().clone())
            .filter(|channel| channel.owner == owner)
            .ok_or_else(|| {
                RegistryErrorKind::NotFound.error_with_msg(format!("No channel with id '{id}'."))
            })
    }

    /// Fail unless the device exists and belongs to the `owner`.
    fn assert_owned_device(&self, owner: &str, device_id: &str) -> Result<(), RegistryError> {
        self.inmem_provider
            .devices
            .get(device_id)
            .filter(|entry| entry.value().owner == owner)
            .map(|_| ())
            .ok_or_else(|| {
                RegistryErrorKind::NotFound
                    .error_with_msg(format!("No device with id '{device_id}'."))
            })
    }
}

#[async_trait::async_trait]
impl ChannelFacade for InMemChannelFacade {
    async fn save(&self, channel: Channel) -> Result<String, RegistryError> {
        if channel.id.is_empty() {
            Err(RegistryErrorKind::MalformedEntity
                .error_with_msg("Channel must have an identifier."))?;
        }
        let id = channel.id.to_owned();
        let entry = self
            .inmem_provider
            .channels
            .get_or_insert_with(id.to_owned(), || channel.clone());
        if entry.value() != &channel {
            Err(RegistryErrorKind::Conflict
                .error_with_msg(format!("Channel '{id}' already exists.")))?;
        }
        Ok(id)
    }

    async fn update(&self, channel: Channel) -> Result<(), RegistryError> {
        self.owned_channel(&channel.owner, &channel.id)?;
        self.inmem_provider
            .channels
            .insert(channel.id.to_owned(), channel);
        Ok(())
    }

    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Channel, RegistryError> {
        self.owned_channel(owner, id)
    }

    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<ChannelsPage, RegistryError> {
        let matches = self
            .inmem_provider
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|channel| {
                channel.owner == owner
                    && InMemoryDatabaseProvider::name_matches(name, &channel.name)
            });
        let (page, channels) = InMemoryDatabaseProvider::page_of(matches, offset, limit, name);
        Ok(ChannelsPage { page, channels })
    }

    async fn retrieve_by_device(
        &self,
        owner: &str,
        device_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ChannelsPage, RegistryError> {
        let matches = self
            .inmem_provider
            .connected_channel_ids(device_id)
            .into_iter()
            .filter_map(|channel_id| self.owned_channel(owner, &channel_id).ok());
        let (page, channels) = InMemoryDatabaseProvider::page_of(matches, offset, limit, None);
        Ok(ChannelsPage { page, channels })
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError> {
        if self.owned_channel(owner, id).is_err() {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("Channel '{id}' of '{owner}' was already gone.");
            }
            return Ok(());
        }
        for device_id in self.inmem_provider.connected_device_ids(id) {
            self.inmem_provider.remove_connection(id, &device_id);
        }
        self.inmem_provider.channels.remove(id);
        Ok(())
    }

    async fn connect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        self.owned_channel(owner, channel_id)?;
        self.assert_owned_device(owner, device_id)?;
        self.inmem_provider.insert_connection(channel_id, device_id);
        Ok(())
    }

    async fn disconnect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        self.owned_channel(owner, channel_id)?;
        self.assert_owned_device(owner, device_id)?;
        if !self.inmem_provider.remove_connection(channel_id, device_id) {
            Err(RegistryErrorKind::NotFound.error_with_msg(format!(
                "Device '{device_id}' is not connected to channel '{channel_id}'."
            )))?;
        }
        Ok(())
    }

    async fn has_device(&self, channel_id: &str, key: &str) -> Result<String, RegistryError> {
        let device_id = self
            .inmem_provider
            .device_ids_by_key
            .get(key)
            .map(|entry| entry.value().to_owned())
            .ok_or_else(|| RegistryErrorKind::NotFound.error_with_msg("No device with this key."))?;
        if !self.inmem_provider.is_connected(channel_id, &device_id) {
            Err(RegistryErrorKind::Unauthorized.error_with_msg(format!(
                "Device '{device_id}' is not connected to channel '{channel_id}'."
            )))?;
        }
        Ok(device_id)
    }
}
