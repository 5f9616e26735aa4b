//! The concrete directory API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use dirsync_common::{EventSink, TokenManager};
use dirsync_core::{BulkScheduler, DirectoryOps};
use dirsync_domain::constants::MAX_PAGES;
use dirsync_domain::{
    ClientConfig, Credentials, DirSyncError, Population, PopulationMap, Record, Result,
};

use crate::api::pagination::parse_page;
use crate::api::token::HttpTokenEndpoint;
use crate::http::HttpClient;

/// Remote directory API client: token lifecycle, paginated listing, and
/// per-entity CRUD, implementing the core's [`DirectoryOps`] port.
///
/// Cheap to share behind an `Arc`; the cached token inside the
/// [`TokenManager`] is the only mutable state.
pub struct DirectoryClient {
    http: HttpClient,
    tokens: TokenManager<HttpTokenEndpoint>,
    events: EventSink,
    api_base_url: String,
    environment_id: String,
    default_concurrency: usize,
}

impl DirectoryClient {
    /// Build a client for one environment.
    ///
    /// The event stream is created here, sized by
    /// [`ClientConfig::event_capacity`]; subscribe via [`Self::events`].
    ///
    /// # Errors
    /// [`DirSyncError::Config`] when the configuration is invalid;
    /// [`DirSyncError::Internal`] when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        let events = EventSink::new(config.event_capacity);
        let http = HttpClient::new(&config, events.clone())?;
        let endpoint = HttpTokenEndpoint::new(http.clone(), config.auth_base_url.clone());
        let tokens = TokenManager::new(endpoint, credentials, events.clone());
        Ok(Self {
            http,
            tokens,
            events,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            environment_id: config.environment_id,
            default_concurrency: config.concurrency,
        })
    }

    /// The client's event stream.
    #[must_use]
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Bulk scheduler over this client, sharing its event stream and using
    /// [`ClientConfig::concurrency`] for jobs without their own setting.
    #[must_use]
    pub fn scheduler(self: &Arc<Self>) -> BulkScheduler {
        BulkScheduler::new(Arc::clone(self) as Arc<dyn DirectoryOps>, self.events.clone())
            .with_default_concurrency(self.default_concurrency)
    }

    /// Full sync read: the population map plus every user in the
    /// environment. The population map is resolved once and is read-only
    /// for the remainder of the sync.
    pub async fn fetch_all(&self) -> Result<(PopulationMap, Vec<Record>)> {
        let populations = self.fetch_populations().await?;
        let users = self.fetch_all_users().await?;
        info!(
            environment_id = %self.environment_id,
            populations = populations.len(),
            users = users.len(),
            "directory fetched"
        );
        Ok((populations, users))
    }

    /// Drop the cached token; the next call re-authenticates.
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    fn users_url(&self) -> String {
        format!("{}/environments/{}/users", self.api_base_url, self.environment_id)
    }

    fn user_url(&self, id: &str) -> String {
        format!("{}/{}", self.users_url(), id)
    }

    fn populations_url(&self) -> String {
        format!("{}/environments/{}/populations", self.api_base_url, self.environment_id)
    }

    async fn send_json(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.tokens.get_token().await?;
        let mut builder = self.http.request(method, url).bearer_auth(&token);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.http.send(builder).await?;
        response
            .json()
            .await
            .map_err(|err| DirSyncError::Network(format!("invalid response body: {err}")))
    }

    /// Walk a paginated listing from `first_url`, following next links.
    ///
    /// A page fetch that exhausts its retries aborts the whole walk and
    /// discards partial data. A next link identical to the current page URL
    /// or a walk beyond the hard page cap stops the walk with the data
    /// collected so far.
    async fn walk(&self, first_url: String, collection: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut url = first_url;
        for _ in 0..MAX_PAGES {
            // Token fetched per page so long walks survive token expiry.
            let token = self.tokens.get_token().await?;
            let response =
                self.http.send(self.http.request(Method::GET, &url).bearer_auth(&token)).await?;
            let body: Value = response
                .json()
                .await
                .map_err(|err| DirSyncError::Network(format!("invalid page body: {err}")))?;

            let page = parse_page(&body, collection);
            items.extend(page.items);

            match page.next {
                None => return Ok(items),
                Some(next) if next == url => {
                    warn!(%url, collection, "next link repeats the current page, stopping walk");
                    return Ok(items);
                }
                Some(next) => {
                    Url::parse(&next).map_err(|err| {
                        DirSyncError::Network(format!("invalid next link {next:?}: {err}"))
                    })?;
                    url = next;
                }
            }
        }
        warn!(collection, cap = MAX_PAGES, "page cap reached, stopping walk");
        Ok(items)
    }
}

#[async_trait]
impl DirectoryOps for DirectoryClient {
    async fn create_user(&self, record: &Record) -> Result<Record> {
        let body = self.send_json(Method::POST, &self.users_url(), Some(&record.to_nested())).await?;
        Ok(Record::from_nested(&body))
    }

    async fn update_user(&self, id: &str, patch: &Record) -> Result<Record> {
        let body =
            self.send_json(Method::PATCH, &self.user_url(id), Some(&patch.to_nested())).await?;
        Ok(Record::from_nested(&body))
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let token = self.tokens.get_token().await?;
        let builder = self.http.request(Method::DELETE, &self.user_url(id)).bearer_auth(&token);
        self.http.send(builder).await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Record> {
        let body = self.send_json(Method::GET, &self.user_url(id), None).await?;
        Ok(Record::from_nested(&body))
    }

    async fn validate_user(&self, record: &Record) -> Result<()> {
        let url = format!("{}?dryRun=true", self.users_url());
        let token = self.tokens.get_token().await?;
        let builder =
            self.http.request(Method::POST, &url).bearer_auth(&token).json(&record.to_nested());
        self.http.send(builder).await?;
        Ok(())
    }

    async fn fetch_all_users(&self) -> Result<Vec<Record>> {
        let items = self.walk(self.users_url(), "users").await?;
        Ok(items.iter().map(Record::from_nested).collect())
    }

    async fn fetch_populations(&self) -> Result<PopulationMap> {
        let items = self.walk(self.populations_url(), "populations").await?;
        Ok(items
            .iter()
            .filter_map(|item| {
                let id = item.get("id").and_then(Value::as_str)?;
                let name = item.get("name").and_then(Value::as_str)?;
                Some(Population { id: id.to_string(), name: name.to_string() })
            })
            .collect())
    }

    async fn test_connection(&self) -> Result<()> {
        self.tokens.get_token().await.map(|_| ())
    }
}
