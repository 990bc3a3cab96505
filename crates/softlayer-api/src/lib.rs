//! Typed Rust client for the SoftLayer REST API.
//!
//! Covers the subset needed for managing virtual guests:
//! create, get, edit, delete, active transactions and tags.

mod types;

pub use reqwest::StatusCode;
pub use types::*;

use serde::Serialize;
use serde::de::DeserializeOwned;
use types::Parameters;

pub const DEFAULT_ENDPOINT: &str = "https://api.softlayer.com/rest/v3";

const GUEST_SERVICE: &str = "SoftLayer_Virtual_Guest";

/// Object mask for the fields read back after provisioning.
const GUEST_MASK: &str = "mask[id,hostname,domain,startCpus,maxMemory,datacenter.name,\
networkComponents.maxSpeed,primaryIpAddress,primaryBackendIpAddress]";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("softlayer api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("softlayer api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

impl Error {
    /// True when the provider reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the SoftLayer REST API.
#[derive(Clone)]
pub struct SoftLayerClient {
    username: String,
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
}

impl SoftLayerClient {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the client at a different REST endpoint (e.g. the private network one).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{GUEST_SERVICE}{path}", self.endpoint)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        endpoint: &'static str,
    ) -> Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.api_key))
            .query(query)
            .send()
            .await?;

        Self::check(resp, endpoint)
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: B,
        endpoint: &'static str,
    ) -> Result<T> {
        let resp = self
            .http
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.api_key))
            .json(&Parameters { parameters })
            .send()
            .await?;

        Self::check(resp, endpoint)
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    // ── Virtual guests ──────────────────────────────────────────────

    pub async fn create_guest(&self, template: &VirtualGuestTemplate) -> Result<VirtualGuest> {
        self.post("/createObject.json", [template], "create guest")
            .await
    }

    pub async fn get_guest(&self, id: i64) -> Result<VirtualGuest> {
        self.get(
            &format!("/{id}/getObject.json"),
            &[("objectMask", GUEST_MASK)],
            "get guest",
        )
        .await
    }

    pub async fn edit_guest(&self, id: i64, guest: &VirtualGuest) -> Result<bool> {
        self.post(&format!("/{id}/editObject.json"), [guest], "edit guest")
            .await
    }

    pub async fn delete_guest(&self, id: i64) -> Result<bool> {
        self.get(&format!("/{id}/deleteObject.json"), &[], "delete guest")
            .await
    }

    // ── Transactions ────────────────────────────────────────────────

    pub async fn get_active_transactions(&self, id: i64) -> Result<Vec<Transaction>> {
        self.get(
            &format!("/{id}/getActiveTransactions.json"),
            &[],
            "get active transactions",
        )
        .await
    }

    // ── Tags ────────────────────────────────────────────────────────

    /// Replace the guest's tags. The provider takes one comma-separated string,
    /// so a tag containing a comma arrives as two tags; callers must reject those.
    pub async fn set_tags(&self, id: i64, tags: &[String]) -> Result<bool> {
        let joined = tags.join(",");
        self.post(&format!("/{id}/setTags.json"), [joined], "set tags")
            .await
    }
}
