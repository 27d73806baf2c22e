//! User endpoints.

use eh_core::constants::paths;
use eh_core::error::EhResult;

use crate::client::ApiClient;
use crate::request::RequestOptions;

impl ApiClient {
    /// Information about the currently authenticated user.
    ///
    /// Returns the parsed body as-is, `None` if the body was not JSON.
    pub async fn user(&self) -> EhResult<Option<serde_json::Value>> {
        self.get(paths::CURRENT_USER, RequestOptions::new()).await
    }
}
