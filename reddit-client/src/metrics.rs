use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub total_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub requests_by_endpoint: BTreeMap<String, EndpointMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetrics {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_response_time: Duration,
    pub max_response_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub endpoint: String,
    pub response_time: Duration,
    pub success: bool,
    pub rate_limited: bool,
}

impl ApiMetrics {
    pub fn average_response_time(&self) -> Duration {
        if self.total_requests == 0 {
            Duration::ZERO
        } else {
            self.total_response_time / self.total_requests as u32
        }
    }

    /// One-line run summary for the log.
    pub fn summary(&self) -> String {
        format!(
            "{} Reddit requests ({} failed, {} rate limited), avg {} ms",
            self.total_requests,
            self.failed_requests,
            self.rate_limited_requests,
            self.average_response_time().as_millis()
        )
    }
}

impl EndpointMetrics {
    fn new() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            total_response_time: Duration::ZERO,
            max_response_time: Duration::ZERO,
        }
    }

    fn update(&mut self, metrics: &RequestMetrics) {
        self.request_count += 1;
        self.total_response_time += metrics.response_time;
        self.max_response_time = self.max_response_time.max(metrics.response_time);

        if metrics.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
    }

    pub fn average_response_time(&self) -> Duration {
        if self.request_count == 0 {
            Duration::ZERO
        } else {
            self.total_response_time / self.request_count as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.request_count as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<ApiMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ApiMetrics::default())),
        }
    }

    pub async fn record_request(&self, request_metrics: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        metrics.total_requests += 1;
        metrics.last_request_time = Some(SystemTime::now());
        metrics.total_response_time += request_metrics.response_time;

        if request_metrics.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }

        if request_metrics.rate_limited {
            metrics.rate_limited_requests += 1;
        }

        metrics
            .requests_by_endpoint
            .entry(request_metrics.endpoint.clone())
            .or_insert_with(EndpointMetrics::new)
            .update(&request_metrics);
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn get_endpoint_metrics(&self, endpoint: &str) -> Option<EndpointMetrics> {
        let metrics = self.metrics.read().await;
        metrics.requests_by_endpoint.get(endpoint).cloned()
    }

    pub async fn export_metrics(&self) -> Result<String, serde_json::Error> {
        let metrics = self.get_metrics().await;
        serde_json::to_string_pretty(&metrics)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(endpoint: &str, millis: u64, success: bool) -> RequestMetrics {
        RequestMetrics {
            endpoint: endpoint.to_string(),
            response_time: Duration::from_millis(millis),
            success,
            rate_limited: false,
        }
    }

    #[tokio::test]
    async fn test_metrics_collection() {
        let collector = MetricsCollector::new();
        collector.record_request(request("/r/all/search", 150, true)).await;
        collector.record_request(request("/r/all/search", 50, false)).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.average_response_time(), Duration::from_millis(100));
        assert!(metrics.last_request_time.is_some());
        assert!(metrics.summary().starts_with("2 Reddit requests (1 failed"));
    }

    #[tokio::test]
    async fn test_endpoint_metrics() {
        let collector = MetricsCollector::new();
        collector.record_request(request("/api/info", 100, true)).await;

        let metrics = collector.get_endpoint_metrics("/api/info").await.unwrap();
        assert_eq!(metrics.request_count, 1);
        assert_eq!(metrics.success_rate(), 1.0);
        assert_eq!(metrics.average_response_time(), Duration::from_millis(100));
        assert!(collector.get_endpoint_metrics("/r/all/comments").await.is_none());
    }

    #[tokio::test]
    async fn test_export_metrics() {
        let collector = MetricsCollector::new();
        collector.record_request(request("/api/info", 150, true)).await;

        let exported = collector.export_metrics().await.unwrap();
        assert!(exported.contains("total_requests"));
        assert!(exported.contains("/api/info"));
    }
}
