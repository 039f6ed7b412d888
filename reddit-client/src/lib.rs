pub mod api;
pub mod metrics;

#[cfg(test)]
mod tests;

use api::RedditApiClient;
use mentions_core::{
    CommentSource, ContentSource, CoreError, Page, ParentPost, RawComment, RawItem,
    RedditApiError, RedditCredentials, SourceOrdering,
};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    TokenResponse, TokenUrl,
};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AppToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl AppToken {
    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Application-only Reddit client. Search makes no documented ordering
/// promise even with `sort=new`, so it is scanned in full and bounded by the
/// server-side `t` filter. The `r/all` comment stream is newest first.
pub struct RedditClient {
    oauth: BasicClient,
    api: RedditApiClient,
    token: RwLock<Option<AppToken>>,
}

impl RedditClient {
    pub fn new(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        let invalid_url = |e: oauth2::url::ParseError| CoreError::Internal {
            message: format!("Invalid Reddit OAuth URL: {e}"),
        };
        let oauth = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(invalid_url)?,
            Some(TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(invalid_url)?),
        )
        .set_auth_type(AuthType::BasicAuth);

        Ok(Self {
            oauth,
            api: RedditApiClient::new(credentials.user_agent.clone())?,
            token: RwLock::new(None),
        })
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    pub async fn set_token(&self, token: AppToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(&*self.token.read().await, Some(token) if !token.is_expired())
    }

    /// Runs the client-credentials grant and stores the resulting token.
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        info!("Requesting application-only Reddit token");
        let http = self.api.http_client();
        let response = self
            .oauth
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http, request))
            .await
            .map_err(|e| match e {
                RequestTokenError::Request(e) => CoreError::Network(e),
                RequestTokenError::ServerResponse(resp) => {
                    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                        reason: resp.error().to_string(),
                    })
                }
                other => CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: other.to_string(),
                }),
            })?;

        let lifetime = response.expires_in().unwrap_or(Duration::from_secs(3600));
        self.set_token(AppToken {
            access_token: response.access_token().secret().clone(),
            expires_at: Instant::now() + lifetime,
        })
        .await;
        debug!("Reddit token valid for {:?}", lifetime);
        Ok(())
    }

    /// Current access token, re-authenticating when missing or about to expire.
    pub async fn ensure_authenticated(&self) -> Result<String, CoreError> {
        if let Some(token) = &*self.token.read().await {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        self.authenticate().await?;
        self.token
            .read()
            .await
            .as_ref()
            .map(|token| token.access_token.clone())
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "No token after authentication".to_string(),
                })
            })
    }

    pub async fn get_api_metrics(&self) -> metrics::ApiMetrics {
        self.api.get_metrics().await
    }

    /// Per-endpoint metrics as pretty JSON, for debug logging.
    pub async fn export_api_metrics(&self) -> Result<String, CoreError> {
        self.api.export_metrics().await
    }
}

async fn send_token_request(
    http: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

impl ContentSource for RedditClient {
    fn ordering(&self) -> SourceOrdering {
        SourceOrdering::Unordered
    }

    async fn search_page(
        &self,
        keyword: &str,
        hours: i64,
        after: Option<&str>,
    ) -> Result<Page<RawItem>, CoreError> {
        let token = self.ensure_authenticated().await?;
        let listing = self.api.search_posts(&token, keyword, hours, after).await?;
        Ok(Page {
            items: api::convert_children(listing.data.children),
            next: listing.data.after,
        })
    }
}

impl CommentSource for RedditClient {
    fn ordering(&self) -> SourceOrdering {
        SourceOrdering::NewestFirst
    }

    async fn comments_page(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Page<RawComment>, CoreError> {
        let token = self.ensure_authenticated().await?;
        let listing = self.api.recent_comments(&token, limit, after).await?;
        Ok(Page {
            items: api::convert_children(listing.data.children),
            next: listing.data.after,
        })
    }

    async fn parent_post(&self, parent_id: &str) -> Result<ParentPost, CoreError> {
        let token = self.ensure_authenticated().await?;
        let post = self.api.get_post_info(&token, parent_id).await?;
        Ok(post.into())
    }
}
