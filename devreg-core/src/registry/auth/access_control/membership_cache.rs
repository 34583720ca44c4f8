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

//! Membership cache interface.

/// Cache of confirmed channel connections.
///
/// Only confirmed connections are held. `false` from [Self::is_connected]
/// means "unknown" and must be verified with the database before access is
/// denied. Implementations are shared by concurrent requests and synchronize
/// internally.
pub trait MembershipCache: Send + Sync {
    /// Return `true` if the device is known to be connected to the channel.
    fn is_connected(&self, channel_id: &str, device_id: &str) -> bool;

    /// Remember that the device is connected to the channel.
    fn connect(&self, channel_id: &str, device_id: &str);

    /// Forget that the device is connected to the channel.
    fn disconnect(&self, channel_id: &str, device_id: &str);

    /// Forget all connections to the channel.
    fn invalidate_channel(&self, channel_id: &str);
}
