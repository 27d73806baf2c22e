//! Device endpoints.

use eh_core::constants::paths;
use eh_core::error::EhResult;

use crate::client::ApiClient;
use crate::request::RequestOptions;

impl ApiClient {
    /// The raw device list of the authenticated account.
    pub async fn devices(&self) -> EhResult<Option<serde_json::Value>> {
        self.get(paths::DEVICES, RequestOptions::new()).await
    }

    /// Check that the token is accepted by issuing `GET devices`.
    ///
    /// The body is discarded; only the outcome of the call matters.
    pub async fn self_test(&self) -> EhResult<()> {
        self.devices().await?;
        Ok(())
    }
}
