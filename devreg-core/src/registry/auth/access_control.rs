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

//! Device access control.

mod key_cache;
mod key_cache_local;
mod membership_cache;
mod membership_cache_local;

pub use self::key_cache::*;
pub use self::key_cache_local::*;
pub use self::membership_cache::*;
pub use self::membership_cache_local::*;
use crate::conf::AppConfig;
use crate::util::with_deadline;
use devreg_dbp::dbp::DatabaseProvider;
use devreg_dbp::dbp::facades::DatabaseProviderFacades;
use devreg_dbp::registry::RegistryError;
use devreg_dbp::registry::RegistryErrorKind;
use std::sync::Arc;
use std::time::Duration;

/** Access controller.

Resolves bearer keys to devices and decides if a device may use a channel.

Answers are served from a [KeyCache] and a [MembershipCache] when both agree
positively. Anything else is decided by the database provider, and positive
decisions are written back to the caches. Every failure, including a slow or
unavailable database, is reported as [RegistryErrorKind::Unauthorized].

The caches are never populated with negative answers and are only cleared
through the `invalidate_*` methods, which must be called by whoever removes
devices, rotates keys or disconnects devices from channels.
*/
pub struct AccessControl {
    dbp: Arc<DatabaseProvider>,
    key_cache: Arc<dyn KeyCache>,
    membership_cache: Arc<dyn MembershipCache>,
    repository_timeout: Duration,
}

impl AccessControl {
    /// Return a new instance with in-process caches.
    pub async fn new(app_config: &AppConfig, dbp: &Arc<DatabaseProvider>) -> Arc<Self> {
        let time_to_live = app_config.cache.time_to_live();
        Self::with_caches(
            dbp,
            KeyCacheLocal::new(time_to_live).await,
            MembershipCacheLocal::new(time_to_live).await,
            app_config.dependencies.repository_timeout(),
        )
    }

    /// Return a new instance using the provided cache implementations.
    pub fn with_caches(
        dbp: &Arc<DatabaseProvider>,
        key_cache: Arc<dyn KeyCache>,
        membership_cache: Arc<dyn MembershipCache>,
        repository_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            dbp: Arc::clone(dbp),
            key_cache,
            membership_cache,
            repository_timeout,
        })
    }

    /// Return the identifier of the device with the bearer `key`.
    pub async fn resolve_key(&self, key: &str) -> Result<String, RegistryError> {
        if let Some(device_id) = self.key_cache.resolve(key) {
            return Ok(device_id);
        }
        let device_id = with_deadline(
            self.repository_timeout,
            "Device lookup",
            self.dbp.device_facade().retrieve_by_key(key),
        )
        .await
        .map_err(|e| Self::deny("key resolution", e))?;
        self.key_cache.put(key, &device_id);
        Ok(device_id)
    }

    /// Return the identifier of the device with the bearer `key` if it is
    /// connected to the channel.
    pub async fn authorize(&self, channel_id: &str, key: &str) -> Result<String, RegistryError> {
        if let Some(device_id) = self.key_cache.resolve(key) {
            if self.membership_cache.is_connected(channel_id, &device_id) {
                return Ok(device_id);
            }
        }
        // A miss in either cache is "unknown", so the database decides.
        let device_id = with_deadline(
            self.repository_timeout,
            "Channel membership lookup",
            self.dbp.channel_facade().has_device(channel_id, key),
        )
        .await
        .map_err(|e| Self::deny(&format!("access to channel '{channel_id}'"), e))?;
        self.key_cache.put(key, &device_id);
        self.membership_cache.connect(channel_id, &device_id);
        Ok(device_id)
    }

    /// Forget every cached key of the device.
    pub fn invalidate_device_key(&self, device_id: &str) {
        self.key_cache.invalidate(device_id);
    }

    /// Forget that the device is connected to the channel.
    pub fn invalidate_membership(&self, channel_id: &str, device_id: &str) {
        self.membership_cache.disconnect(channel_id, device_id);
    }

    /// Forget all connections to the channel.
    pub fn invalidate_channel(&self, channel_id: &str) {
        self.membership_cache.invalidate_channel(channel_id);
    }

    /// Log the cause and replace it with [RegistryErrorKind::Unauthorized].
    fn deny(operation: &str, cause: RegistryError) -> RegistryError {
        match cause.kind() {
            RegistryErrorKind::NotFound | RegistryErrorKind::Unauthorized => {
                log::debug!("Denied {operation}: {cause}");
            }
            _ => {
                log::warn!("Denied {operation} due to failed database lookup: {cause}");
            }
        }
        RegistryErrorKind::Unauthorized.error()
    }
}
