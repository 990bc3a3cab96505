use async_trait::async_trait;
use softlayer_api::{SoftLayerClient, Transaction, VirtualGuest, VirtualGuestTemplate};

use crate::types::GuestId;
use crate::{Error, Result, VirtualGuestService};

/// [`VirtualGuestService`] backed by the SoftLayer REST API.
///
/// Delegates to `softlayer_api::SoftLayerClient` for all HTTP calls.
pub struct SoftLayerService {
    client: SoftLayerClient,
}

impl SoftLayerService {
    pub fn new(client: SoftLayerClient) -> Self {
        Self { client }
    }

    /// Create from env vars:
    ///
    /// - `SOFTLAYER_USERNAME` (required)
    /// - `SOFTLAYER_API_KEY` (required)
    /// - `SOFTLAYER_ENDPOINT` (default: the public REST endpoint)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let username = std::env::var("SOFTLAYER_USERNAME")
            .map_err(|_| Error::MissingEnv("SOFTLAYER_USERNAME".into()))?;
        let api_key = std::env::var("SOFTLAYER_API_KEY")
            .map_err(|_| Error::MissingEnv("SOFTLAYER_API_KEY".into()))?;

        let mut client = SoftLayerClient::new(username, api_key);
        if let Ok(endpoint) = std::env::var("SOFTLAYER_ENDPOINT") {
            client = client.with_endpoint(endpoint);
        }

        Ok(Self::new(client))
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }
}

#[async_trait]
impl VirtualGuestService for SoftLayerService {
    async fn create_object(
        &self,
        template: &VirtualGuestTemplate,
    ) -> softlayer_api::Result<VirtualGuest> {
        self.client.create_guest(template).await
    }

    async fn get_object(&self, id: GuestId) -> softlayer_api::Result<VirtualGuest> {
        self.client.get_guest(id.0).await
    }

    async fn edit_object(&self, id: GuestId, guest: &VirtualGuest) -> softlayer_api::Result<bool> {
        self.client.edit_guest(id.0, guest).await
    }

    async fn delete_object(&self, id: GuestId) -> softlayer_api::Result<bool> {
        self.client.delete_guest(id.0).await
    }

    async fn get_active_transactions(
        &self,
        id: GuestId,
    ) -> softlayer_api::Result<Vec<Transaction>> {
        self.client.get_active_transactions(id.0).await
    }

    async fn set_tags(&self, id: GuestId, tags: &[String]) -> softlayer_api::Result<bool> {
        self.client.set_tags(id.0, tags).await
    }
}
