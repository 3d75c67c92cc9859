use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use panelerp_auth::{CapabilityGrants, Role, RoleSubmission};
use panelerp_core::RoleId;

use super::{RoleCatalogStore, RoleListing, StoreError};
use crate::config::CatalogSettings;

const ROLES_PATH: &str = "/api/ajustes/roles";

#[derive(Debug, Deserialize)]
struct RoleEnvelope {
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the role catalog endpoints.
#[derive(Debug, Clone)]
pub struct HttpRoleCatalogStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoleCatalogStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &CatalogSettings) -> Result<Self, StoreError> {
        Self::new(settings.base_url.clone(), settings.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn roles_url(&self) -> String {
        format!("{}{}", self.base_url, ROLES_PATH)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(rejection(resp).await)
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// A non-success answer is a rejection only when it carries `{ "error": .. }`.
async fn rejection(resp: Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => StoreError::rejected(status.as_u16(), err.error),
        Err(_) if status == StatusCode::NOT_FOUND => StoreError::NotFound,
        Err(_) => StoreError::Transport(format!("unexpected status {status}")),
    }
}

#[async_trait::async_trait]
impl RoleCatalogStore for HttpRoleCatalogStore {
    async fn list(&self) -> Result<RoleListing, StoreError> {
        let resp = self.send(self.client.get(self.roles_url())).await?;
        Self::decode(resp).await
    }

    async fn create(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        let resp = self
            .send(self.client.post(self.roles_url()).json(submission))
            .await?;
        Ok(Self::decode::<RoleEnvelope>(resp).await?.role)
    }

    async fn update(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        let resp = self
            .send(self.client.put(self.roles_url()).json(submission))
            .await?;
        Ok(Self::decode::<RoleEnvelope>(resp).await?.role)
    }

    async fn delete(&self, id: &RoleId) -> Result<(), StoreError> {
        self.send(
            self.client
                .delete(self.roles_url())
                .query(&[("id", id.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn grants(&self, id: &RoleId) -> Result<CapabilityGrants, StoreError> {
        let url = format!("{}/{}/permisos", self.roles_url(), id);
        let resp = self.send(self.client.get(url)).await?;
        Self::decode(resp).await
    }
}
