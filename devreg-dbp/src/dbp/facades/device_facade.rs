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

//! Database facade for operations related to devices.

use crate::registry::Device;
use crate::registry::DevicesPage;
use crate::registry::RegistryError;

/// Database facade for operations related to devices.
///
/// All lookups except [Self::retrieve_by_key] are scoped to an owner. A device
/// that belongs to someone else is reported as
/// [RegistryErrorKind::NotFound](crate::registry::RegistryErrorKind::NotFound).
#[async_trait::async_trait]
pub trait DeviceFacade: Send + Sync {
    /// Persist a new device and return its identifier.
    ///
    /// Fails with `Conflict` if the identifier or the key is already in use.
    async fn save(&self, device: Device) -> Result<String, RegistryError>;

    /// Update name and metadata of an existing device. The key is left as is.
    async fn update(&self, device: Device) -> Result<(), RegistryError>;

    /// Replace the bearer key of the device.
    async fn update_key(&self, owner: &str, id: &str, key: &str) -> Result<(), RegistryError>;

    /// Return the device with the `id` that belongs to the `owner`.
    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Device, RegistryError>;

    /// Return the identifier of the device with the bearer `key`.
    async fn retrieve_by_key(&self, key: &str) -> Result<String, RegistryError>;

    /// Return a page of the owner's devices, optionally filtered by `name`.
    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<DevicesPage, RegistryError>;

    /// Return a page of the owner's devices connected to the channel.
    async fn retrieve_by_channel(
        &self,
        owner: &str,
        channel_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DevicesPage, RegistryError>;

    /// Remove the device and all of its channel connections.
    ///
    /// Removing a device that does not exist is not an error.
    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError>;
}
