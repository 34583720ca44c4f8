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

//! Key cache interface.

/// Cache of bearer keys that resolved to a device identifier.
///
/// A miss is a normal outcome and never means that the key is invalid.
/// Implementations are shared by concurrent requests and synchronize
/// internally.
pub trait KeyCache: Send + Sync {
    /// Return the cached device identifier of the bearer `key`.
    fn resolve(&self, key: &str) -> Option<String>;

    /// Cache that `key` resolves to `device_id`.
    ///
    /// Replaces any previous mapping of the `key`.
    fn put(&self, key: &str, device_id: &str);

    /// Forget every key that resolves to `device_id`.
    fn invalidate(&self, device_id: &str);
}
