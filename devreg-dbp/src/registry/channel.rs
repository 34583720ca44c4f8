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

//! Channel that devices connect to.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A named group that devices connect to in order to exchange messages.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Channel {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the operator that controls the channel.
    pub owner: String,
    /// Human friendly name.
    #[serde(default)]
    pub name: String,
    /// Free form meta data.
    #[serde(default)]
    pub metadata: Value,
}

impl Channel {
    /// Return a new instance without identifiers.
    pub fn new(name: &str, metadata: Value) -> Self {
        Self {
            id: String::default(),
            owner: String::default(),
            name: name.to_owned(),
            metadata,
        }
    }
}
