use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::AppError;

/// PostgREST equality filter, rendered as `column=eq.value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    fn as_query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            api_key: config.store_api_key().to_string(),
        }
    }

    fn get_headers(&self, prefer_representation: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).context("invalid apikey header")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.api_key.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                    .context("invalid authorization header")?,
            );
        }

        if prefer_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        table: &str,
        filters: &[Filter],
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!("Making {} request to {}", method, url);

        let writes = method != Method::GET;
        let query: Vec<(String, String)> = filters.iter().map(Filter::as_query_pair).collect();

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(writes)?)
            .query(&query);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Rows of `table` matching every filter.
    pub async fn select<T>(&self, table: &str, filters: &[Filter]) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, table, filters, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// First row matching the filters, if any.
    pub async fn select_one<T>(&self, table: &str, filters: &[Filter]) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let mut rows: Vec<T> = self.select(table, filters).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    pub async fn insert<T>(&self, table: &str, body: Value) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let mut rows: Vec<T> = self
            .request(Method::POST, table, &[], Some(body))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppError::Database(format!("insert into {} returned no rows", table)));
        }
        Ok(rows.swap_remove(0))
    }

    /// Conditional update. Only rows matching every filter are written, so a
    /// filter on the expected current value turns this into a compare-and-swap:
    /// an empty result means the row was missing or had already changed.
    pub async fn update_where<T>(
        &self,
        table: &str,
        filters: &[Filter],
        body: Value,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, table, filters, Some(body))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
