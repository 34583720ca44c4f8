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

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod conf;
pub mod registry;
pub mod util {
    //! Utilities

    mod deadline;
    mod time;

    pub use self::deadline::*;
    pub use self::time::*;
}

pub use self::conf::AppConfig;
pub use self::registry::DeviceRegistry;

pub use devreg_dbp::registry::Channel;
pub use devreg_dbp::registry::ChannelsPage;
pub use devreg_dbp::registry::Device;
pub use devreg_dbp::registry::DevicesPage;
pub use devreg_dbp::registry::PageMetadata;
pub use devreg_dbp::registry::RegistryError;
pub use devreg_dbp::registry::RegistryErrorKind;
