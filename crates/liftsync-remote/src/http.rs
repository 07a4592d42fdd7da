//! PostgREST-style HTTP client for the remote store.
//!
//! Reads use equality filters on declared columns
//! (`GET /rest/v1/<source>?select=*&user_id=eq.<id>`); writes use batched
//! upserts with an explicit conflict target
//! (`POST /rest/v1/<table>?on_conflict=<keys>` with
//! `Prefer: resolution=merge-duplicates`).

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::store::{RemoteStore, RowFilter};

/// Connection settings for the remote store.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote API, without a trailing slash.
    pub base_url: String,
    /// Project API key, sent on every request.
    pub api_key: String,
}

/// HTTP implementation of [`RemoteStore`].
pub struct HttpRemote {
    client: reqwest::Client,
    config: RemoteConfig,
    /// Per-session bearer token; swapped on sign-in/sign-out.
    access_token: RwLock<Option<String>>,
}

impl HttpRemote {
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        if config.base_url.is_empty() {
            return Err(RemoteError::Config("base_url must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            access_token: RwLock::new(None),
        })
    }

    /// Install or clear the session bearer token.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token;
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("apikey", &self.config.api_key);
        match self.access_token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Filter operand in the remote's query syntax (`eq.<literal>`).
fn filter_operand(value: &Value) -> String {
    match value {
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch(&self, source: &str, filters: &[RowFilter]) -> RemoteResult<Vec<Value>> {
        let mut query: Vec<(String, String)> = vec![("select".into(), "*".into())];
        for filter in filters {
            query.push((filter.column.clone(), filter_operand(&filter.value)));
        }
        let request = self.authed(self.client.get(self.rest_url(source)).query(&query));
        let response = Self::check(request.send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        debug!(source, rows = rows.len(), "fetched remote rows");
        Ok(rows)
    }

    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> RemoteResult<()> {
        let request = self
            .authed(self.client.post(self.rest_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        Self::check(request.send().await?).await?;
        debug!(table, rows = rows.len(), "upserted remote rows");
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[RowFilter]) -> RemoteResult<()> {
        let query: Vec<(String, String)> = filters
            .iter()
            .map(|filter| (filter.column.clone(), filter_operand(&filter.value)))
            .collect();
        let request = self.authed(self.client.delete(self.rest_url(table)).query(&query));
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn end_session(&self) -> RemoteResult<()> {
        let url = format!(
            "{}/auth/v1/logout",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.authed(self.client.post(url));
        Self::check(request.send().await?).await?;
        self.set_access_token(None);
        Ok(())
    }
}
