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

//! Lock-free in-process membership cache.

use super::MembershipCache;
use crate::util::get_timestamp_micros;
use crossbeam_skiplist::SkipMap;
use std::sync::Arc;
use std::time::Duration;

/** Lock-free in-process [MembershipCache].

Confirmed connections are grouped per channel, so that a channel can be
dropped as a whole. Each connection carries an expiration time.

A connection that is cached concurrently with the invalidation of its channel
may be lost. This is harmless, since a missing entry only results in asking
the database again.
*/
pub struct MembershipCacheLocal {
    time_to_live_micros: Option<u64>,
    /// Expiration of each connected device by channel.
    channels: SkipMap<String, SkipMap<String, u64>>,
}

impl MembershipCacheLocal {
    /// Return a new instance.
    pub async fn new(time_to_live: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            time_to_live_micros: time_to_live
                .map(|ttl| u64::try_from(ttl.as_micros()).unwrap_or(u64::MAX)),
            channels: SkipMap::default(),
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

    /// Remove all connections that expired before `now` and channels without
    /// connections.
    fn purge_expired(&self, now: u64) {
        for channel in self.channels.iter() {
            for connection in channel.value().iter() {
                if *connection.value() <= now {
                    connection.remove();
                }
            }
            if channel.value().is_empty() {
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!("Purged all connections of channel '{}'.", channel.key());
                }
                channel.remove();
            }
        }
    }
}

impl MembershipCache for MembershipCacheLocal {
    fn is_connected(&self, channel_id: &str, device_id: &str) -> bool {
        let now = get_timestamp_micros();
        self.channels
            .get(channel_id)
            .and_then(|channel| {
                channel
                    .value()
                    .get(device_id)
                    .map(|connection| *connection.value())
            })
            .is_some_and(|expires_micros| expires_micros > now)
    }

    fn connect(&self, channel_id: &str, device_id: &str) {
        self.channels
            .get_or_insert_with(channel_id.to_owned(), SkipMap::default)
            .value()
            .insert(device_id.to_owned(), self.expires_micros());
    }

    fn disconnect(&self, channel_id: &str, device_id: &str) {
        if let Some(channel) = self.channels.get(channel_id) {
            channel.value().remove(device_id);
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Invalidated connection of device '{device_id}' to channel '{channel_id}'.");
        }
    }

    fn invalidate_channel(&self, channel_id: &str) {
        self.channels.remove(channel_id);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Invalidated all connections to channel '{channel_id}'.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_disconnect() {
        let cache = MembershipCacheLocal::new(None).await;
        assert!(!cache.is_connected("c1", "d1"));
        cache.connect("c1", "d1");
        cache.connect("c1", "d1");
        cache.connect("c1", "d2");
        assert!(cache.is_connected("c1", "d1"));
        assert!(!cache.is_connected("c2", "d1"));
        cache.disconnect("c1", "d1");
        assert!(!cache.is_connected("c1", "d1"));
        assert!(cache.is_connected("c1", "d2"));
        // Disconnecting twice or from an unknown channel is a no-op
        cache.disconnect("c1", "d1");
        cache.disconnect("c9", "d1");
    }

    #[tokio::test]
    async fn test_invalidate_channel() {
        let cache = MembershipCacheLocal::new(None).await;
        cache.connect("c1", "d1");
        cache.connect("c1", "d2");
        cache.connect("c2", "d1");
        cache.invalidate_channel("c1");
        assert!(!cache.is_connected("c1", "d1"));
        assert!(!cache.is_connected("c1", "d2"));
        assert!(cache.is_connected("c2", "d1"));
        cache.connect("c1", "d1");
        assert!(cache.is_connected("c1", "d1"));
    }

    #[tokio::test]
    async fn test_expiration() {
        let cache = MembershipCacheLocal::new(Some(Duration::from_millis(50))).await;
        cache.connect("c1", "d1");
        assert!(cache.is_connected("c1", "d1"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!cache.is_connected("c1", "d1"));
        cache.purge_expired(get_timestamp_micros());
        assert!(cache.channels.is_empty());
    }
}
