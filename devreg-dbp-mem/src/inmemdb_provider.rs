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

//! Ephemeral in-memory implementation of [DatabaseProvider].

mod inmem_facades;

use self::inmem_facades::InMemProviderFacades;
use crossbeam_skiplist::SkipMap;
use crossbeam_skiplist::SkipSet;
use devreg_dbp::dbp::DatabaseProvider;
use devreg_dbp::registry::Channel;
use devreg_dbp::registry::Device;
use devreg_dbp::registry::PageMetadata;
use std::sync::Arc;

/// Ephemeral in-memory implementation of [DatabaseProvider].
pub struct InMemoryDatabaseProvider {
    /// Devices by identifier.
    devices: SkipMap<String, Device>,
    /// Device identifier by bearer key.
    device_ids_by_key: SkipMap<String, String>,
    /// Channels by identifier.
    channels: SkipMap<String, Channel>,
    /// Connections as `(channel_id, device_id)`.
    connections: SkipSet<(String, String)>,
    /// Connections as `(device_id, channel_id)`.
    connections_by_device: SkipSet<(String, String)>,
}

impl InMemoryDatabaseProvider {
    /// Return a new instance.
    pub async fn new() -> Arc<Self> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Using in-mem db provider.");
        }
        Arc::new(Self {
            devices: SkipMap::default(),
            device_ids_by_key: SkipMap::default(),
            channels: SkipMap::default(),
            connections: SkipSet::default(),
            connections_by_device: SkipSet::default(),
        })
    }

    /// Get [DatabaseProvider] instance.
    pub fn as_database_provider(self: &Arc<Self>) -> DatabaseProvider {
        DatabaseProvider::new(Arc::new(InMemProviderFacades::new(self)))
    }

    /// Return `true` if the device is connected to the channel.
    fn is_connected(&self, channel_id: &str, device_id: &str) -> bool {
        self.connections
            .contains(&(channel_id.to_owned(), device_id.to_owned()))
    }

    fn insert_connection(&self, channel_id: &str, device_id: &str) {
        self.connections
            .insert((channel_id.to_owned(), device_id.to_owned()));
        self.connections_by_device
            .insert((device_id.to_owned(), channel_id.to_owned()));
    }

    /// Return `true` if the connection existed.
    fn remove_connection(&self, channel_id: &str, device_id: &str) -> bool {
        self.connections_by_device
            .remove(&(device_id.to_owned(), channel_id.to_owned()));
        self.connections
            .remove(&(channel_id.to_owned(), device_id.to_owned()))
            .is_some()
    }

    /// Return the identifiers of all devices connected to the channel.
    fn connected_device_ids(&self, channel_id: &str) -> Vec<String> {
        Self::second_of_pairs_starting_with(&self.connections, channel_id)
    }

    /// Return the identifiers of all channels the device is connected to.
    fn connected_channel_ids(&self, device_id: &str) -> Vec<String> {
        Self::second_of_pairs_starting_with(&self.connections_by_device, device_id)
    }

    fn second_of_pairs_starting_with(set: &SkipSet<(String, String)>, first: &str) -> Vec<String> {
        set.range((first.to_owned(), String::new())..)
            .take_while(|entry| entry.value().0 == first)
            .map(|entry| entry.value().1.to_owned())
            .collect()
    }

    /// Apply `offset` and `limit` to a sorted sequence of matches.
    fn page_of<T>(
        matches: impl Iterator<Item = T>,
        offset: u64,
        limit: u64,
        name: Option<&str>,
    ) -> (PageMetadata, Vec<T>) {
        let mut total = 0u64;
        let mut items = Vec::new();
        for item in matches {
            if total >= offset && total - offset < limit {
                items.push(item);
            }
            total += 1;
        }
        let page = PageMetadata {
            total,
            offset,
            limit,
            name: name.map(str::to_owned),
        };
        (page, items)
    }

    /// Return `true` when there is no filter or the `value` contains it.
    fn name_matches(filter: Option<&str>, value: &str) -> bool {
        filter.is_none_or(|filter| value.contains(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devreg_dbp::dbp::facades::DatabaseProviderFacades;
    use devreg_dbp::registry::RegistryErrorKind;
    use serde_json::json;

    fn device(id: &str, owner: &str, key: &str) -> Device {
        Device {
            id: id.to_owned(),
            owner: owner.to_owned(),
            name: format!("device {id}"),
            key: key.to_owned(),
            metadata: json!({}),
        }
    }

    fn channel(id: &str, owner: &str) -> Channel {
        Channel {
            id: id.to_owned(),
            owner: owner.to_owned(),
            name: format!("channel {id}"),
            metadata: json!({}),
        }
    }

    async fn provider() -> DatabaseProvider {
        InMemoryDatabaseProvider::new().await.as_database_provider()
    }

    #[tokio::test]
    async fn test_key_lookup_and_rotation() {
        let dbp = provider().await;
        let devices = dbp.device_facade();
        devices.save(device("d1", "alice", "k1")).await.unwrap();
        assert_eq!(devices.retrieve_by_key("k1").await.unwrap(), "d1");
        devices.update_key("alice", "d1", "k2").await.unwrap();
        assert_eq!(
            devices.retrieve_by_key("k1").await.unwrap_err().kind(),
            &RegistryErrorKind::NotFound
        );
        assert_eq!(devices.retrieve_by_key("k2").await.unwrap(), "d1");
        assert_eq!(
            devices.retrieve_by_id("alice", "d1").await.unwrap().key,
            "k2"
        );
    }

    #[tokio::test]
    async fn test_key_conflicts() {
        let dbp = provider().await;
        let devices = dbp.device_facade();
        devices.save(device("d1", "alice", "k1")).await.unwrap();
        devices.save(device("d2", "alice", "k2")).await.unwrap();
        let res = devices.save(device("d3", "alice", "k1")).await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Conflict);
        let res = devices.update_key("alice", "d2", "k1").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Conflict);
        assert_eq!(devices.retrieve_by_key("k2").await.unwrap(), "d2");
        let res = devices.save(device("d1", "alice", "k9")).await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Conflict);
        assert!(devices.retrieve_by_key("k9").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_of_same_device() {
        let dbp = Arc::new(provider().await);
        let mut handles = Vec::new();
        for i in 0..8 {
            let dbp = Arc::clone(&dbp);
            handles.push(tokio::spawn(async move {
                dbp.device_facade()
                    .save(device("d1", "alice", &format!("k{i}")))
                    .await
                    .is_ok()
            }));
        }
        let mut saved = 0;
        for handle in handles {
            if handle.await.unwrap() {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
        let devices = dbp.device_facade();
        let key = devices.retrieve_by_id("alice", "d1").await.unwrap().key;
        for i in 0..8 {
            let res = devices.retrieve_by_key(&format!("k{i}")).await;
            if format!("k{i}") == key {
                assert_eq!(res.unwrap(), "d1");
            } else {
                assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::NotFound);
            }
        }
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let dbp = provider().await;
        dbp.device_facade()
            .save(device("d1", "alice", "k1"))
            .await
            .unwrap();
        dbp.channel_facade().save(channel("c1", "bob")).await.unwrap();
        let res = dbp.device_facade().retrieve_by_id("bob", "d1").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::NotFound);
        let res = dbp.channel_facade().connect("bob", "c1", "d1").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::NotFound);
        dbp.device_facade().remove("bob", "d1").await.unwrap();
        assert_eq!(dbp.device_facade().retrieve_by_key("k1").await.unwrap(), "d1");
    }

    #[tokio::test]
    async fn test_membership() {
        let dbp = provider().await;
        let channels = dbp.channel_facade();
        dbp.device_facade()
            .save(device("d1", "alice", "k1"))
            .await
            .unwrap();
        channels.save(channel("c1", "alice")).await.unwrap();
        let res = channels.has_device("c1", "k1").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Unauthorized);
        let res = channels.has_device("c1", "unknown").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::NotFound);
        channels.connect("alice", "c1", "d1").await.unwrap();
        assert_eq!(channels.has_device("c1", "k1").await.unwrap(), "d1");
        channels.disconnect("alice", "c1", "d1").await.unwrap();
        assert!(channels.has_device("c1", "k1").await.is_err());
        let res = channels.disconnect("alice", "c1", "d1").await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_removal_drops_connections() {
        let dbp = provider().await;
        let channels = dbp.channel_facade();
        dbp.device_facade()
            .save(device("d1", "alice", "k1"))
            .await
            .unwrap();
        channels.save(channel("c1", "alice")).await.unwrap();
        channels.save(channel("c2", "alice")).await.unwrap();
        channels.connect("alice", "c1", "d1").await.unwrap();
        channels.connect("alice", "c2", "d1").await.unwrap();
        channels.remove("alice", "c1").await.unwrap();
        assert!(channels.has_device("c1", "k1").await.is_err());
        let page = channels
            .retrieve_by_device("alice", "d1", 0, 10)
            .await
            .unwrap();
        assert_eq!(page.page.total, 1);
        assert_eq!(page.channels[0].id, "c2");
        dbp.device_facade().remove("alice", "d1").await.unwrap();
        let page = dbp
            .device_facade()
            .retrieve_by_channel("alice", "c2", 0, 10)
            .await
            .unwrap();
        assert!(page.devices.is_empty());
        // Removing again is fine
        dbp.device_facade().remove("alice", "d1").await.unwrap();
        channels.remove("alice", "c1").await.unwrap();
    }

    #[tokio::test]
    async fn test_paging_and_name_filter() {
        let dbp = provider().await;
        let devices = dbp.device_facade();
        for i in 0..5 {
            devices
                .save(device(&format!("d{i}"), "alice", &format!("k{i}")))
                .await
                .unwrap();
        }
        devices.save(device("x", "bob", "kx")).await.unwrap();
        let page = devices.retrieve_all("alice", 1, 2, None).await.unwrap();
        assert_eq!(page.page.total, 5);
        assert_eq!(
            page.devices.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["d1", "d2"]
        );
        let page = devices
            .retrieve_all("alice", 0, 10, Some("device d4"))
            .await
            .unwrap();
        assert_eq!(page.page.total, 1);
        assert_eq!(page.page.name.as_deref(), Some("device d4"));
        let page = devices.retrieve_all("alice", 10, 10, None).await.unwrap();
        assert_eq!(page.page.total, 5);
        assert!(page.devices.is_empty());
    }
}
