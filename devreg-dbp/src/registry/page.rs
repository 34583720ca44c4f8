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

//! Paged listings of entities.

use super::Channel;
use super::Device;
use serde::Deserialize;
use serde::Serialize;

/// Meta data that helps navigating pages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageMetadata {
    /// Total number of matching entities.
    pub total: u64,
    /// Position of the first entity in this page.
    pub offset: u64,
    /// Requested maximum page size.
    pub limit: u64,
    /// Name filter that was applied, if any.
    pub name: Option<String>,
}

/// A page of devices.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct DevicesPage {
    /// Paging information.
    pub page: PageMetadata,
    /// The devices of this page.
    pub devices: Vec<Device>,
}

/// A page of channels.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ChannelsPage {
    /// Paging information.
    pub page: PageMetadata,
    /// The channels of this page.
    pub channels: Vec<Channel>,
}
