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

//! Device registry core.

pub mod auth {
    //! Device authorization

    mod access_control;

    pub use self::access_control::*;
}
mod identity_provider;
#[cfg(test)]
mod test_support;
mod users_service;

pub use self::identity_provider::IdentityProvider;
pub use self::identity_provider::UuidIdentityProvider;
pub use self::users_service::UsersService;
use crate::conf::AppConfig;
use crate::util::with_deadline;
use auth::AccessControl;
use devreg_dbp::dbp::DatabaseProvider;
use devreg_dbp::dbp::facades::DatabaseProviderFacades;
use devreg_dbp::registry::Channel;
use devreg_dbp::registry::ChannelsPage;
use devreg_dbp::registry::Device;
use devreg_dbp::registry::DevicesPage;
use devreg_dbp::registry::RegistryError;
use devreg_dbp::registry::RegistryErrorKind;
use devreg_dbp_mem::InMemoryDatabaseProvider;
use std::sync::Arc;
use std::time::Duration;

/** Device registry.

Performs the operations of device and channel owners and answers the access
questions of the data plane through [AccessControl].

Every owner operation first identifies the owner with the [UsersService].
Operations that make cached authorizations stale (device removal, key
rotation, disconnect and channel removal) invalidate the affected cache
entries once the database call has returned and before the result is handed
back to the caller.
*/
pub struct DeviceRegistry {
    dbp: Arc<DatabaseProvider>,
    access_control: Arc<AccessControl>,
    users: Arc<dyn UsersService>,
    idp: Arc<dyn IdentityProvider>,
    users_timeout: Duration,
    repository_timeout: Duration,
}

impl DeviceRegistry {
    /// Return a new instance using the configured database provider.
    pub async fn new(
        app_config: &Arc<AppConfig>,
        users: &Arc<dyn UsersService>,
    ) -> Result<Arc<Self>, RegistryError> {
        // Setup persistence from config.
        let dbp = match app_config.backend.implementation() {
            "mem" => {
                let inmem_provider = InMemoryDatabaseProvider::new().await;
                Arc::new(inmem_provider.as_database_provider())
            }
            unknown_provider => Err(RegistryErrorKind::Unspecified.error_with_msg(format!(
                "Unknown database provider type '{unknown_provider}'."
            )))?,
        };
        let access_control = AccessControl::new(app_config, &dbp).await;
        log::info!(
            "Device registry dependencies of {} {} have been created.",
            app_config.app_name_lowercase(),
            app_config.app_version()
        );
        Ok(Self::with_parts(
            &dbp,
            &access_control,
            users,
            Arc::new(UuidIdentityProvider),
            app_config.dependencies.users_timeout(),
            app_config.dependencies.repository_timeout(),
        ))
    }

    /// Return a new instance from already created parts.
    pub fn with_parts(
        dbp: &Arc<DatabaseProvider>,
        access_control: &Arc<AccessControl>,
        users: &Arc<dyn UsersService>,
        idp: Arc<dyn IdentityProvider>,
        users_timeout: Duration,
        repository_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            dbp: Arc::clone(dbp),
            access_control: Arc::clone(access_control),
            users: Arc::clone(users),
            idp,
            users_timeout,
            repository_timeout,
        })
    }

    /// Return the access controller used for data plane checks.
    pub fn access_control(&self) -> &Arc<AccessControl> {
        &self.access_control
    }

    /// Return the owner identifier of the operator `token`.
    async fn identify_owner(&self, token: &str) -> Result<String, RegistryError> {
        with_deadline(
            self.users_timeout,
            "Operator identification",
            self.users.identify(token),
        )
        .await
        .map_err(|e| {
            log::debug!("Failed to identify operator: {e}");
            RegistryErrorKind::Unauthorized.error()
        })
    }

    /// Await a database call, but give up after the repository timeout.
    async fn in_repository<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T, RegistryError>>,
    ) -> Result<T, RegistryError> {
        with_deadline(self.repository_timeout, operation, future).await
    }

    /// Register a new device for the operator.
    ///
    /// A fresh key is generated unless the `device` already has one.
    pub async fn add_device(&self, token: &str, device: Device) -> Result<Device, RegistryError> {
        let owner = self.identify_owner(token).await?;
        let mut device = Device {
            id: self.idp.id()?,
            owner,
            ..device
        };
        if device.key.is_empty() {
            device.key = self.idp.id()?;
        }
        device.id = self
            .in_repository("Device save", self.dbp.device_facade().save(device.clone()))
            .await?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Added device '{}' for '{}'.", device.id, device.owner);
        }
        Ok(device)
    }

    /// Update name and meta data of the operator's device.
    pub async fn update_device(&self, token: &str, device: Device) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Device update",
            self.dbp.device_facade().update(Device { owner, ..device }),
        )
        .await
    }

    /// Replace the bearer key of the operator's device.
    pub async fn update_key(&self, token: &str, id: &str, key: &str) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        let res = self
            .in_repository(
                "Device key update",
                self.dbp.device_facade().update_key(&owner, id, key),
            )
            .await;
        self.access_control.invalidate_device_key(id);
        res
    }

    /// Return the operator's device.
    pub async fn view_device(&self, token: &str, id: &str) -> Result<Device, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Device retrieval",
            self.dbp.device_facade().retrieve_by_id(&owner, id),
        )
        .await
    }

    /// Return a page of the operator's devices.
    pub async fn list_devices(
        &self,
        token: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<DevicesPage, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Device listing",
            self.dbp
                .device_facade()
                .retrieve_all(&owner, offset, limit, name),
        )
        .await
    }

    /// Return a page of the operator's devices connected to the channel.
    pub async fn list_devices_by_channel(
        &self,
        token: &str,
        channel_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DevicesPage, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Device listing by channel",
            self.dbp
                .device_facade()
                .retrieve_by_channel(&owner, channel_id, offset, limit),
        )
        .await
    }

    /// Remove the operator's device.
    pub async fn remove_device(&self, token: &str, id: &str) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        let res = self
            .in_repository("Device removal", self.dbp.device_facade().remove(&owner, id))
            .await;
        self.access_control.invalidate_device_key(id);
        res
    }

    /// Create a new channel for the operator.
    pub async fn create_channel(
        &self,
        token: &str,
        channel: Channel,
    ) -> Result<Channel, RegistryError> {
        let owner = self.identify_owner(token).await?;
        let mut channel = Channel {
            id: self.idp.id()?,
            owner,
            ..channel
        };
        channel.id = self
            .in_repository("Channel save", self.dbp.channel_facade().save(channel.clone()))
            .await?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Created channel '{}' for '{}'.", channel.id, channel.owner);
        }
        Ok(channel)
    }

    /// Update name and meta data of the operator's channel.
    pub async fn update_channel(&self, token: &str, channel: Channel) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Channel update",
            self.dbp.channel_facade().update(Channel { owner, ..channel }),
        )
        .await
    }

    /// Return the operator's channel.
    pub async fn view_channel(&self, token: &str, id: &str) -> Result<Channel, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Channel retrieval",
            self.dbp.channel_facade().retrieve_by_id(&owner, id),
        )
        .await
    }

    /// Return a page of the operator's channels.
    pub async fn list_channels(
        &self,
        token: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<ChannelsPage, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Channel listing",
            self.dbp
                .channel_facade()
                .retrieve_all(&owner, offset, limit, name),
        )
        .await
    }

    /// Return a page of the operator's channels that the device is connected
    /// to.
    pub async fn list_channels_by_device(
        &self,
        token: &str,
        device_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ChannelsPage, RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Channel listing by device",
            self.dbp
                .channel_facade()
                .retrieve_by_device(&owner, device_id, offset, limit),
        )
        .await
    }

    /// Remove the operator's channel.
    pub async fn remove_channel(&self, token: &str, id: &str) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        let res = self
            .in_repository("Channel removal", self.dbp.channel_facade().remove(&owner, id))
            .await;
        self.access_control.invalidate_channel(id);
        res
    }

    /// Connect the operator's device to the operator's channel.
    pub async fn connect(
        &self,
        token: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        self.in_repository(
            "Connect",
            self.dbp
                .channel_facade()
                .connect(&owner, channel_id, device_id),
        )
        .await
    }

    /// Disconnect the operator's device from the operator's channel.
    pub async fn disconnect(
        &self,
        token: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        let owner = self.identify_owner(token).await?;
        let res = self
            .in_repository(
                "Disconnect",
                self.dbp
                    .channel_facade()
                    .disconnect(&owner, channel_id, device_id),
            )
            .await;
        self.access_control
            .invalidate_membership(channel_id, device_id);
        res
    }

    /// Return the identifier of the device with the bearer `key` if it may
    /// access the channel.
    ///
    /// See [AccessControl::authorize].
    pub async fn can_access(&self, channel_id: &str, key: &str) -> Result<String, RegistryError> {
        self.access_control.authorize(channel_id, key).await
    }

    /// Return the identifier of the device with the bearer `key`.
    ///
    /// See [AccessControl::resolve_key].
    pub async fn identify(&self, key: &str) -> Result<String, RegistryError> {
        self.access_control.resolve_key(key).await
    }
}
