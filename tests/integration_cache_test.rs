// ==========================================
// 外部接口缓存集成测试
// ==========================================
// 测试目标: 通过公开接口验证缓存命中 / 过期 / 清理 / 重试
// ==========================================

use agenda_import::integrations::config::QuickBooksCredentials;
use agenda_import::integrations::manager::{CONTACTS_TTL, DISTANCE_TTL};
use agenda_import::integrations::{
    ApiIntegrationManager, HttpRequest, HttpTransport, IntegrationConfig, IntegrationError, IntegrationResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 按 URL 片段返回固定响应, 记录调用次数
struct RoutingTransport {
    routes: Vec<(&'static str, Value)>,
    calls: AtomicUsize,
}

impl RoutingTransport {
    fn new(routes: Vec<(&'static str, Value)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for RoutingTransport {
    async fn send(&self, request: HttpRequest) -> IntegrationResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment))
            .map(|(_, response)| response.clone())
            .ok_or(IntegrationError::Http {
                status: 404,
                message: request.url,
            })
    }
}

fn config() -> IntegrationConfig {
    IntegrationConfig {
        google_maps_api_key: Some("maps-key".to_string()),
        quickbooks: Some(QuickBooksCredentials {
            access_token: "qb-token".to_string(),
            realm_id: "4620816365".to_string(),
        }),
        retry_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

fn distance_response() -> Value {
    json!({
        "status": "OK",
        "rows": [{ "elements": [{
            "status": "OK",
            "distance": { "value": 5200, "text": "5,2 km" },
            "duration": { "value": 780, "text": "13 min" }
        }]}]
    })
}

#[tokio::test(start_paused = true)]
async fn test_ttls_are_fixed_per_call_site() {
    let transport = RoutingTransport::new(vec![
        ("distancematrix", distance_response()),
        ("/query", json!({ "QueryResponse": { "Customer": [{ "Id": "7", "DisplayName": "Salon Marie" }] } })),
    ]);
    let manager = ApiIntegrationManager::new(config(), transport.clone());

    let distance = manager.calculate_distance("Montréal", "Laval").await.unwrap();
    assert_eq!(distance.distance_meters, 5200);
    let customers = manager.get_quickbooks_customers().await.unwrap();
    assert_eq!(customers[0].display_name, "Salon Marie");
    assert_eq!(transport.calls(), 2);

    // 距离过期, 联系人仍有效
    tokio::time::advance(DISTANCE_TTL).await;
    manager.calculate_distance("Montréal", "Laval").await.unwrap();
    manager.get_quickbooks_customers().await.unwrap();
    assert_eq!(transport.calls(), 3);

    tokio::time::advance(CONTACTS_TTL).await;
    let stats = manager.cache_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.expired, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_request_is_not_cached() {
    let transport = RoutingTransport::new(vec![]);
    let manager = ApiIntegrationManager::new(config(), transport.clone());

    let err = manager.calculate_distance("A", "B").await.unwrap_err();

    assert!(matches!(err, IntegrationError::Http { status: 404, .. }));
    assert_eq!(transport.calls(), 3);
    assert_eq!(manager.cache_stats().total, 0);
}

#[tokio::test]
async fn test_clear_cache_by_substring() {
    let transport = RoutingTransport::new(vec![("distancematrix", distance_response())]);
    let manager = ApiIntegrationManager::new(config(), transport.clone());

    manager.calculate_distance("A", "B").await.unwrap();
    manager.calculate_distance("A", "C").await.unwrap();

    assert_eq!(manager.clear_cache(Some("|C")), 1);
    manager.calculate_distance("A", "B").await.unwrap();
    assert_eq!(transport.calls(), 2);
}
