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

//! Database facade for operations related to channels and connections.

use crate::registry::Channel;
use crate::registry::ChannelsPage;
use crate::registry::RegistryError;

/// Database facade for operations related to channels and connections.
#[async_trait::async_trait]
pub trait ChannelFacade: Send + Sync {
    /// Persist a new channel and return its identifier.
    async fn save(&self, channel: Channel) -> Result<String, RegistryError>;

    /// Update name and metadata of an existing channel.
    async fn update(&self, channel: Channel) -> Result<(), RegistryError>;

    /// Return the channel with the `id` that belongs to the `owner`.
    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Channel, RegistryError>;

    /// Return a page of the owner's channels, optionally filtered by `name`.
    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<ChannelsPage, RegistryError>;

    /// Return a page of the owner's channels that the device is connected to.
    async fn retrieve_by_device(
        &self,
        owner: &str,
        device_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ChannelsPage, RegistryError>;

    /// Remove the channel and all of its connections.
    ///
    /// Removing a channel that does not exist is not an error.
    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError>;

    /// Connect the device to the channel. Both must belong to the `owner`.
    async fn connect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError>;

    /// Disconnect the device from the channel.
    ///
    /// Fails with `NotFound` if the device wasn't connected.
    async fn disconnect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError>;

    /// Return the identifier of the device with bearer `key` if it is connected
    /// to the channel.
    ///
    /// Fails with `NotFound` when no device has the key and with
    /// `Unauthorized` when the device isn't connected.
    async fn has_device(&self, channel_id: &str, key: &str) -> Result<String, RegistryError>;
}
