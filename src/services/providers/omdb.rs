//! OMDb API provider
//!
//! API Flow:
//! 1. Title Search: `/?s={text}&page={n}[&y={year}]` → up to 10 summaries plus `totalResults`
//! 2. Details: `/?i={imdb_id}&plot=full` → full record including the genre list
//!
//! OMDb reports most failures with HTTP 200 and `"Response": "False"`, so the
//! body is always inspected.
use crate::{
    cache::{CacheKey, QueryCache},
    cached,
    error::{AppError, AppResult},
    models::{
        omdb::{OmdbDetail, OmdbSearchResponse},
        MovieDetail, ResultPage, SearchQuery,
    },
    services::providers::{FetchPolicy, MovieProvider},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: QueryCache,
}

impl OmdbProvider {
    pub fn new(cache: QueryCache, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "OMDB_API_KEY is not set; add it to the environment or .env file".to_string(),
                )
            })
    }

    fn endpoint(&self) -> String {
        format!("{}/", self.api_url.trim_end_matches('/'))
    }

    async fn request_search(&self, query: &SearchQuery, page: u32) -> AppResult<ResultPage> {
        let api_key = self.api_key()?;
        let page_param = page.to_string();

        let mut params = vec![
            ("s", query.text.trim()),
            ("apikey", api_key),
            ("page", page_param.as_str()),
        ];
        if let Some(year) = query.year_filter() {
            params.push(("y", year));
        }

        let response = self
            .http_client
            .get(self.endpoint())
            .query(&params)
            .send()
            .await?;

        let body: OmdbSearchResponse = Self::read_json(response).await?;
        let result_page = ResultPage::from(body);

        tracing::info!(
            query = %query.text,
            page,
            results = result_page.items.len(),
            total = result_page.total_results,
            success = result_page.success,
            provider = "omdb",
            "Title search completed"
        );

        Ok(result_page)
    }

    async fn request_detail(&self, id: &str) -> AppResult<MovieDetail> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(self.endpoint())
            .query(&[("i", id), ("apikey", api_key), ("plot", "full")])
            .send()
            .await?;

        let body: OmdbDetail = Self::read_json(response).await?;
        let detail = body.into_detail(id)?;

        tracing::debug!(id = %id, genre = %detail.genre, provider = "omdb", "Detail fetched");

        Ok(detail)
    }

    /// Checks the HTTP status and decodes the body
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Configuration(
                "OMDb rejected the configured API key".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize OMDb response"
            );
            AppError::ExternalApi(format!("Failed to parse OMDb response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
        policy: FetchPolicy,
    ) -> AppResult<ResultPage> {
        if query.text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        if page == 0 {
            return Err(AppError::InvalidInput("Pages start at 1".to_string()));
        }

        let key = CacheKey::search(query, page);

        match policy {
            FetchPolicy::CacheFirst => cached!(self.cache, key, self.request_search(query, page)),
            FetchPolicy::Refresh => {
                self.cache
                    .refetch(key, move || self.request_search(query, page))
                    .await
            }
        }
    }

    async fn fetch_detail(&self, id: &str) -> AppResult<MovieDetail> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Title id cannot be empty".to_string()));
        }

        cached!(self.cache, CacheKey::detail(id), self.request_detail(id))
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
