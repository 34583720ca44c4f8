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

//! Generation of unique identifiers for new entities.

use devreg_dbp::registry::RegistryError;

/// Source of globally unique identifiers for new devices, channels and keys.
pub trait IdentityProvider: Send + Sync {
    /// Return a new unique identifier.
    fn id(&self) -> Result<String, RegistryError>;
}

/// [IdentityProvider] that hands out random (version 4) UUIDs.
#[derive(Default)]
pub struct UuidIdentityProvider;

impl IdentityProvider for UuidIdentityProvider {
    fn id(&self) -> Result<String, RegistryError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        let idp = UuidIdentityProvider;
        let first = idp.id().unwrap();
        let second = idp.id().unwrap();
        assert_eq!(first.len(), 36);
        assert_ne!(first, second);
    }
}
