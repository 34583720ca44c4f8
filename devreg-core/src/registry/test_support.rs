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

//! Test doubles for the database provider and the users service.

use super::UsersService;
use devreg_dbp::dbp::DatabaseProvider;
use devreg_dbp::dbp::facades::*;
use devreg_dbp::registry::*;
use devreg_dbp_mem::InMemoryDatabaseProvider;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

pub const TEST_REPOSITORY_TIMEOUT: Duration = Duration::from_millis(100);
pub const TEST_OWNER: &str = "owner";

/// Initialize logging.
pub fn init_logger() {
    env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .map_err(|e| log::trace!("Env logger for testing was probably already initialized: {e:?}"))
        .ok();
}

/// Behavior of [SwitchableDatabase].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Available = 0,
    Failing = 1,
    Stalled = 2,
}

/// In-memory database that can be made to fail or stall, and that counts the
/// calls that reach it.
pub struct SwitchableDatabase {
    inner: DatabaseProvider,
    mode: AtomicU8,
    calls: AtomicU64,
}

impl SwitchableDatabase {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryDatabaseProvider::new().await.as_database_provider(),
            mode: AtomicU8::new(Mode::Available as u8),
            calls: AtomicU64::default(),
        })
    }

    pub fn as_database_provider(self: &Arc<Self>) -> DatabaseProvider {
        DatabaseProvider::new(Arc::new(SwitchableFacades {
            channel_facade: SwitchableChannelFacade {
                db: Arc::clone(self),
            },
            device_facade: SwitchableDeviceFacade {
                db: Arc::clone(self),
            },
        }))
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Number of calls that reached the database.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn gate(&self) -> Result<(), RegistryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.mode.load(Ordering::Relaxed) {
            1 => Err(RegistryErrorKind::Unavailable.error_with_msg("Database is down.")),
            2 => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(RegistryErrorKind::Unavailable.error_with_msg("Database is stalled."))
            }
            _ => Ok(()),
        }
    }

    pub async fn seed_device(&self, id: &str, key: &str) {
        let device = Device {
            id: id.to_owned(),
            owner: TEST_OWNER.to_owned(),
            name: id.to_owned(),
            key: key.to_owned(),
            metadata: json!({}),
        };
        self.inner.device_facade().save(device).await.unwrap();
    }

    pub async fn seed_channel(&self, id: &str) {
        let channel = Channel {
            id: id.to_owned(),
            owner: TEST_OWNER.to_owned(),
            name: id.to_owned(),
            metadata: json!({}),
        };
        self.inner.channel_facade().save(channel).await.unwrap();
    }

    pub async fn seed_connection(&self, channel_id: &str, device_id: &str) {
        self.inner
            .channel_facade()
            .connect(TEST_OWNER, channel_id, device_id)
            .await
            .unwrap();
    }

    pub async fn remove_connection(&self, channel_id: &str, device_id: &str) {
        self.inner
            .channel_facade()
            .disconnect(TEST_OWNER, channel_id, device_id)
            .await
            .unwrap();
    }

    pub async fn rotate_key(&self, device_id: &str, key: &str) {
        self.inner
            .device_facade()
            .update_key(TEST_OWNER, device_id, key)
            .await
            .unwrap();
    }
}

struct SwitchableFacades {
    channel_facade: SwitchableChannelFacade,
    device_facade: SwitchableDeviceFacade,
}

impl DatabaseProviderFacades for SwitchableFacades {
    fn channel_facade(&self) -> &dyn ChannelFacade {
        &self.channel_facade
    }

    fn device_facade(&self) -> &dyn DeviceFacade {
        &self.device_facade
    }
}

struct SwitchableDeviceFacade {
    db: Arc<SwitchableDatabase>,
}

#[async_trait::async_trait]
impl DeviceFacade for SwitchableDeviceFacade {
    async fn save(&self, device: Device) -> Result<String, RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().save(device).await
    }

    async fn update(&self, device: Device) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().update(device).await
    }

    async fn update_key(&self, owner: &str, id: &str, key: &str) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().update_key(owner, id, key).await
    }

    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Device, RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().retrieve_by_id(owner, id).await
    }

    async fn retrieve_by_key(&self, key: &str) -> Result<String, RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().retrieve_by_key(key).await
    }

    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<DevicesPage, RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .device_facade()
            .retrieve_all(owner, offset, limit, name)
            .await
    }

    async fn retrieve_by_channel(
        &self,
        owner: &str,
        channel_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DevicesPage, RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .device_facade()
            .retrieve_by_channel(owner, channel_id, offset, limit)
            .await
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db.inner.device_facade().remove(owner, id).await
    }
}

struct SwitchableChannelFacade {
    db: Arc<SwitchableDatabase>,
}

#[async_trait::async_trait]
impl ChannelFacade for SwitchableChannelFacade {
    async fn save(&self, channel: Channel) -> Result<String, RegistryError> {
        self.db.gate().await?;
        self.db.inner.channel_facade().save(channel).await
    }

    async fn update(&self, channel: Channel) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db.inner.channel_facade().update(channel).await
    }

    async fn retrieve_by_id(&self, owner: &str, id: &str) -> Result<Channel, RegistryError> {
        self.db.gate().await?;
        self.db.inner.channel_facade().retrieve_by_id(owner, id).await
    }

    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> Result<ChannelsPage, RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .channel_facade()
            .retrieve_all(owner, offset, limit, name)
            .await
    }

    async fn retrieve_by_device(
        &self,
        owner: &str,
        device_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ChannelsPage, RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .channel_facade()
            .retrieve_by_device(owner, device_id, offset, limit)
            .await
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db.inner.channel_facade().remove(owner, id).await
    }

    async fn connect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .channel_facade()
            .connect(owner, channel_id, device_id)
            .await
    }

    async fn disconnect(
        &self,
        owner: &str,
        channel_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        self.db.gate().await?;
        self.db
            .inner
            .channel_facade()
            .disconnect(owner, channel_id, device_id)
            .await
    }

    async fn has_device(&self, channel_id: &str, key: &str) -> Result<String, RegistryError> {
        self.db.gate().await?;
        self.db.inner.channel_facade().has_device(channel_id, key).await
    }
}

/// Users service with a fixed set of operator tokens.
pub struct StaticUsersService {
    owners_by_token: HashMap<String, String>,
    stalled: AtomicBool,
}

impl StaticUsersService {
    pub fn new(tokens_and_owners: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            owners_by_token: tokens_and_owners
                .iter()
                .map(|(token, owner)| (token.to_string(), owner.to_string()))
                .collect(),
            stalled: AtomicBool::default(),
        })
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl UsersService for StaticUsersService {
    async fn identify(&self, token: &str) -> Result<String, RegistryError> {
        if self.stalled.load(Ordering::Relaxed) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.owners_by_token
            .get(token)
            .cloned()
            .ok_or_else(|| RegistryErrorKind::Unauthorized.error_with_msg("Unknown token."))
    }
}
