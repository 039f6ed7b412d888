use crate::metrics::{MetricsCollector, RequestMetrics};
use chrono::{DateTime, Utc};
use mentions_core::{CoreError, ParentPost, RawComment, RawItem, RedditApiError};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const REDDIT_WEB_BASE: &str = "https://reddit.com";
/// Largest page the listing endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub link_id: String,
}

/// Maps a window length onto the coarsest search `t` filter that covers it.
pub fn time_filter_for_hours(hours: i64) -> &'static str {
    match hours {
        h if h <= 1 => "hour",
        h if h <= 24 => "day",
        h if h <= 24 * 7 => "week",
        h if h <= 24 * 31 => "month",
        h if h <= 24 * 366 => "year",
        _ => "all",
    }
}

pub fn web_url(permalink: &str) -> String {
    format!("{}{}", REDDIT_WEB_BASE, permalink)
}

fn to_utc(created_utc: f64, permalink: &str) -> Result<DateTime<Utc>, CoreError> {
    Some(created_utc)
        .filter(|secs| secs.is_finite())
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unusable created_utc {} on {}", created_utc, permalink),
            })
        })
}

/// Query for one page of site-wide search, newest first.
pub fn search_query<'a>(
    keyword: &'a str,
    hours: i64,
    limit: &'a str,
    after: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![
        ("q", keyword),
        ("sort", "new"),
        ("t", time_filter_for_hours(hours)),
        ("type", "link"),
        ("limit", limit),
    ];
    if let Some(after_val) = after {
        params.push(("after", after_val));
    }
    params
}

#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    metrics: MetricsCollector,
    base_url: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            metrics: MetricsCollector::new(),
            base_url: REDDIT_API_BASE.to_string(),
            user_agent,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let start_time = Instant::now();

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params);

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let outcome = match request_builder.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(status_error(response.status(), response.headers(), endpoint)),
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    Err(CoreError::RedditApi(RedditApiError::RequestTimeout))
                } else {
                    Err(CoreError::Network(e))
                }
            }
        };

        let rate_limited = matches!(
            &outcome,
            Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { .. }))
        );
        self.metrics
            .record_request(RequestMetrics {
                endpoint: endpoint.to_string(),
                response_time: start_time.elapsed(),
                success: outcome.is_ok(),
                rate_limited,
            })
            .await;

        outcome
    }

    async fn get_listing<T>(
        &self,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<RedditListing<T>, CoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .make_request(Method::GET, endpoint, access_token, query_params)
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse listing from {}: {}", endpoint, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse listing from {}", endpoint),
            })
        })
    }

    /// Site-wide search sorted by newest.
    pub async fn search_posts(
        &self,
        access_token: &str,
        keyword: &str,
        hours: i64,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let limit = MAX_PAGE_SIZE.to_string();
        let params = search_query(keyword, hours, &limit, after);

        let listing: RedditListing<RedditPostData> = self
            .get_listing("/r/all/search", access_token, &params)
            .await?;
        info!(
            "Retrieved {} search results for '{}'",
            listing.data.children.len(),
            keyword
        );
        Ok(listing)
    }

    /// Newest comments across `r/all`.
    pub async fn recent_comments(
        &self,
        access_token: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditCommentData>, CoreError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![("limit", limit.as_str())];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let listing: RedditListing<RedditCommentData> = self
            .get_listing("/r/all/comments", access_token, &params)
            .await?;
        debug!("Retrieved {} comments", listing.data.children.len());
        Ok(listing)
    }

    /// Looks up a post by fullname (`t3_...`).
    pub async fn get_post_info(
        &self,
        access_token: &str,
        fullname: &str,
    ) -> Result<RedditPostData, CoreError> {
        let listing: RedditListing<RedditPostData> = self
            .get_listing("/api/info", access_token, &[("id", fullname)])
            .await?;

        listing
            .data
            .children
            .into_iter()
            .next()
            .map(|child| child.data)
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::PostNotFound {
                    post_id: fullname.to_string(),
                })
            })
    }

    pub async fn get_metrics(&self) -> crate::metrics::ApiMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        Ok(self.metrics.export_metrics().await?)
    }
}

fn status_error(status: StatusCode, headers: &HeaderMap, endpoint: &str) -> CoreError {
    error!("Request failed with status: {} for {}", status, endpoint);

    match status.as_u16() {
        429 => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, Reddit asked to wait {} seconds", retry_after);
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })
        }
        401 => CoreError::RedditApi(RedditApiError::InvalidToken),
        403 => CoreError::RedditApi(RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        }),
        404 => CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "Resource not found".to_string(),
        }),
        code if status.is_server_error() => {
            CoreError::RedditApi(RedditApiError::ServerError { status_code: code })
        }
        code => CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} from {}", code, endpoint),
        }),
    }
}

impl TryFrom<RedditPostData> for RawItem {
    type Error = CoreError;

    fn try_from(post_data: RedditPostData) -> Result<Self, CoreError> {
        let created_at = to_utc(post_data.created_utc, &post_data.permalink)?;
        Ok(Self {
            title: post_data.title,
            body: post_data.selftext,
            permalink: web_url(&post_data.permalink),
            subreddit: post_data.subreddit,
            created_at,
        })
    }
}

impl From<RedditPostData> for ParentPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            title: post_data.title,
            url: web_url(&post_data.permalink),
        }
    }
}

impl TryFrom<RedditCommentData> for RawComment {
    type Error = CoreError;

    fn try_from(comment_data: RedditCommentData) -> Result<Self, CoreError> {
        let created_at = to_utc(comment_data.created_utc, &comment_data.permalink)?;
        Ok(Self {
            body: comment_data.body,
            permalink: web_url(&comment_data.permalink),
            subreddit: comment_data.subreddit,
            created_at,
            parent_id: comment_data.link_id,
        })
    }
}

/// Converts listing children, dropping (and logging) any that cannot be
/// placed in time.
pub fn convert_children<D, T>(children: Vec<RedditListingChild<D>>) -> Vec<T>
where
    T: TryFrom<D, Error = CoreError>,
{
    children
        .into_iter()
        .filter_map(|child| match T::try_from(child.data) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping listing entry: {}", e);
                None
            }
        })
        .collect()
}
