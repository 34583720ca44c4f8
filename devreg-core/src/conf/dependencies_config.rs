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

//! Parsing of configuration for calls to external dependencies.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

use super::AppConfigDefaults;

/// Configuration of calls to external dependencies.
#[derive(Debug, Deserialize, Serialize)]
pub struct DependenciesConfig {
    /// See [Self::repository_timeout()].
    repositorytimeoutmillis: u64,
    /// See [Self::users_timeout()].
    userstimeoutmillis: u64,
}

impl AppConfigDefaults for DependenciesConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "repositorytimeoutmillis", "1000")?
            .set_default(prefix.to_string() + "." + "userstimeoutmillis", "1000")
    }
}

impl DependenciesConfig {
    /// Deadline for a single database provider call. Defaults to one second.
    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repositorytimeoutmillis)
    }

    /// Deadline for identifying an operator token. Defaults to one second.
    pub fn users_timeout(&self) -> Duration {
        Duration::from_millis(self.userstimeoutmillis)
    }
}
