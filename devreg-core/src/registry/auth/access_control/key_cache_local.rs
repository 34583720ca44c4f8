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

//! Lock-free in-process key cache.

use super::KeyCache;
use crate::util::get_timestamp_micros;
use crossbeam_skiplist::SkipMap;
use crossbeam_skiplist::SkipSet;
use std::sync::Arc;
use std::time::Duration;

/// Cached resolution of a bearer key.
struct CachedDeviceId {
    device_id: String,
    expires_micros: u64,
}

/** Lock-free in-process [KeyCache].

Keys are indexed both ways. The reverse `(device_id, key)` index lets
[KeyCache::invalidate] drop every key of a device, including a key that was
rotated away, without scanning the whole cache.

Entries live until invalidated, unless a time-to-live is configured. Expired
entries are ignored on lookup and purged in the background.
*/
pub struct KeyCacheLocal {
    time_to_live_micros: Option<u64>,
    device_ids_by_key: SkipMap<String, CachedDeviceId>,
    keys_by_device_id: SkipSet<(String, String)>,
}

impl KeyCacheLocal {
    /// Return a new instance.
    pub async fn new(time_to_live: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            time_to_live_micros: time_to_live
                .map(|ttl| u64::try_from(ttl.as_micros()).unwrap_or(u64::MAX)),
            device_ids_by_key: SkipMap::default(),
            keys_by_device_id: SkipSet::default(),
        })
        .init()
        .await
    }

    /// Initialize background tasks.
    async fn init(self: Arc<Self>) -> Arc<Self> {
        if let Some(time_to_live_micros) = self.time_to_live_micros {
            let weak = Arc::downgrade(&self);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_micros(time_to_live_micros / 10 + 1)).await;
                    let Some(cache) = weak.upgrade() else {
                        break;
                    };
                    cache.purge_expired(get_timestamp_micros());
                }
            });
        }
        self
    }

    fn expires_micros(&self) -> u64 {
        self.time_to_live_micros
            .map_or(u64::MAX, |ttl| get_timestamp_micros().saturating_add(ttl))
    }

    /// Remove all entries that expired before `now`.
    fn purge_expired(&self, now: u64) {
        let mut purged = 0usize;
        for entry in self.device_ids_by_key.iter() {
            let cached = entry.value();
            if cached.expires_micros <= now {
                let pair = (cached.device_id.to_owned(), entry.key().to_owned());
                self.keys_by_device_id.remove(&pair);
                if entry.remove() {
                    purged += 1;
                }
                // A newer entry of the same device still needs its reverse entry.
                if self.is_cached(&pair.1, &pair.0) {
                    self.keys_by_device_id.insert(pair);
                }
            }
        }
        if purged > 0 && log::log_enabled!(log::Level::Trace) {
            log::trace!("Purged {purged} expired keys.");
        }
    }

    /// Return `true` if the `key` is cached for the device, expired or not.
    fn is_cached(&self, key: &str, device_id: &str) -> bool {
        self.device_ids_by_key
            .get(key)
            .is_some_and(|entry| entry.value().device_id == device_id)
    }

    /// Add the `(device_id, key)` pair to the reverse index.
    fn index_key(&self, key: &str, device_id: &str) {
        if let Some(previous) = self.device_ids_by_key.get(key) {
            let previous_device_id = &previous.value().device_id;
            if previous_device_id != device_id {
                self.keys_by_device_id
                    .remove(&(previous_device_id.to_owned(), key.to_owned()));
            }
        }
        self.keys_by_device_id
            .insert((device_id.to_owned(), key.to_owned()));
    }

    /// Insert the forward entry, unless the reverse entry was invalidated
    /// meanwhile.
    fn publish_key(&self, key: &str, device_id: &str) {
        let entry = self.device_ids_by_key.insert(
            key.to_owned(),
            CachedDeviceId {
                device_id: device_id.to_owned(),
                expires_micros: self.expires_micros(),
            },
        );
        if !self
            .keys_by_device_id
            .contains(&(device_id.to_owned(), key.to_owned()))
        {
            entry.remove();
        }
    }

    /// Number of cached keys, including expired ones not yet purged.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.device_ids_by_key.len()
    }
}

impl KeyCache for KeyCacheLocal {
    fn resolve(&self, key: &str) -> Option<String> {
        let now = get_timestamp_micros();
        self.device_ids_by_key
            .get(key)
            .filter(|entry| entry.value().expires_micros > now)
            .map(|entry| entry.value().device_id.to_owned())
    }

    fn put(&self, key: &str, device_id: &str) {
        // A forward entry is only kept while its reverse entry exists.
        self.index_key(key, device_id);
        self.publish_key(key, device_id);
    }

    fn invalidate(&self, device_id: &str) {
        let keys = self
            .keys_by_device_id
            .range((device_id.to_owned(), String::new())..)
            .take_while(|entry| entry.value().0 == device_id)
            .map(|entry| {
                entry.remove();
                entry.value().1.to_owned()
            })
            .collect::<Vec<_>>();
        for key in &keys {
            if let Some(entry) = self.device_ids_by_key.get(key) {
                if entry.value().device_id == device_id {
                    entry.remove();
                }
            }
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "Invalidated {} cached keys of device '{device_id}'.",
                keys.len()
            );
        }
    }
}
