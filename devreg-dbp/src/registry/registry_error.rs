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

//! Device registry errors.

use std::error::Error;
use std::fmt;

/// Cause of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorKind {
    /// General failure. See message for details.
    Unspecified,
    /// Malformed entity specification.
    MalformedEntity,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Non-existent entity.
    NotFound,
    /// Entity already exists.
    Conflict,
    /// A dependency did not respond in time.
    Timeout,
    /// A dependency could not be reached.
    Unavailable,
}

impl RegistryErrorKind {
    /// Create a new instance with an error message.
    pub fn error_with_msg<S: AsRef<str>>(self, msg: S) -> RegistryError {
        RegistryError {
            kind: self,
            msg: Some(msg.as_ref().to_string()),
        }
    }

    /// Create a new instance without an error message.
    pub fn error(self) -> RegistryError {
        RegistryError {
            kind: self,
            msg: None,
        }
    }
}

impl fmt::Display for RegistryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/** Device registry error.

Create a new instance via [RegistryErrorKind].
*/
#[derive(Debug)]
pub struct RegistryError {
    kind: RegistryErrorKind,
    msg: Option<String>,
}

impl RegistryError {
    /// Return the type of error.
    pub fn kind(&self) -> &RegistryErrorKind {
        &self.kind
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(msg) = &self.msg {
            write!(f, "{} {}", self.kind, msg)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl AsRef<RegistryError> for RegistryError {
    fn as_ref(&self) -> &RegistryError {
        self
    }
}

impl Error for RegistryError {}
