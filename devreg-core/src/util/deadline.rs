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

//! Bounded waiting for external dependencies.

use devreg_dbp::registry::RegistryError;
use devreg_dbp::registry::RegistryErrorKind;
use std::time::Duration;

/// Await the `future`, but give up after `deadline`.
///
/// An elapsed deadline is reported as [RegistryErrorKind::Timeout] and the
/// `future` is dropped.
pub async fn with_deadline<T, F>(
    deadline: Duration,
    operation: &str,
    future: F,
) -> Result<T, RegistryError>
where
    F: Future<Output = Result<T, RegistryError>>,
{
    tokio::time::timeout(deadline, future)
        .await
        .unwrap_or_else(|_elapsed| {
            Err(RegistryErrorKind::Timeout.error_with_msg(format!(
                "{operation} did not complete within {} ms.",
                deadline.as_millis()
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline() {
        let res = with_deadline(Duration::from_millis(500), "Quick", async { Ok(1) }).await;
        assert_eq!(res.unwrap(), 1);
        let res: Result<(), RegistryError> =
            with_deadline(Duration::from_millis(10), "Stalled", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Timeout);
        let res: Result<(), RegistryError> = with_deadline(Duration::from_millis(500), "Failing", async {
            Err(RegistryErrorKind::Unavailable.error())
        })
        .await;
        assert_eq!(res.unwrap_err().kind(), &RegistryErrorKind::Unavailable);
    }
}
