#[cfg(test)]
mod tests {
    use crate::{api, metrics, AppToken, RedditClient};
    use mentions_core::{
        CommentSource, ContentSource, RedditCredentials, SourceOrdering,
    };
    use std::time::{Duration, Instant};

    fn create_test_credentials() -> RedditCredentials {
        RedditCredentials {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            user_agent: "reddit-mentions/1.0 by test_user".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RedditClient::new(&create_test_credentials());
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.api().user_agent(), "reddit-mentions/1.0 by test_user");
        assert!(!tokio_test::block_on(client.is_authenticated()));
    }

    #[test]
    fn test_source_orderings() {
        let client = RedditClient::new(&create_test_credentials()).unwrap();
        // Search is scanned in full; only the comment stream may stop early.
        assert_eq!(ContentSource::ordering(&client), SourceOrdering::Unordered);
        assert_eq!(CommentSource::ordering(&client), SourceOrdering::NewestFirst);
    }

    #[tokio::test]
    async fn test_token_expiry() {
        let client = RedditClient::new(&create_test_credentials()).unwrap();

        client
            .set_token(AppToken {
                access_token: "valid_token".to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            })
            .await;
        assert!(client.is_authenticated().await);
        assert_eq!(client.ensure_authenticated().await.unwrap(), "valid_token");

        // Inside the refresh margin counts as expired.
        let nearly_expired = AppToken {
            access_token: "old_token".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(nearly_expired.is_expired());
        client.set_token(nearly_expired).await;
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_integration_client_metrics() {
        let client = RedditClient::new(&create_test_credentials()).unwrap();

        let metrics = client.get_api_metrics().await;
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.summary(), "0 Reddit requests (0 failed, 0 rate limited), avg 0 ms");
    }

    #[test]
    fn test_post_data_into_parent() {
        let post_data = api::RedditPostData {
            title: "Galera cluster keeps splitting".to_string(),
            selftext: String::new(),
            subreddit: "mariadb".to_string(),
            permalink: "/r/mariadb/comments/p1/galera/".to_string(),
            created_utc: 1640995200.0,
        };

        let parent: mentions_core::ParentPost = post_data.into();
        assert_eq!(parent.title, "Galera cluster keeps splitting");
        assert_eq!(parent.url, "https://reddit.com/r/mariadb/comments/p1/galera/");
    }

    #[tokio::test]
    async fn test_endpoint_specific_metrics() {
        let collector = metrics::MetricsCollector::new();

        collector
            .record_request(metrics::RequestMetrics {
                endpoint: "/r/all/search".to_string(),
                response_time: Duration::from_millis(200),
                success: false,
                rate_limited: true,
            })
            .await;

        let api_metrics = collector.get_metrics().await;
        assert_eq!(api_metrics.rate_limited_requests, 1);
        let endpoint = collector.get_endpoint_metrics("/r/all/search").await.unwrap();
        assert_eq!(endpoint.error_count, 1);
        assert_eq!(endpoint.success_rate(), 0.0);
    }
}
