// ==========================================
// Agenda 导入 - 外部接口管理器
// ==========================================
// make_request: 缓存命中直接返回; 未命中按 RetryPolicy 调用, 成功后写入缓存
// TTL 按调用点固定, 不随单次调用变化
// 缺少密钥 → MissingApiKey, 不发起网络请求
// ==========================================

use crate::integrations::cache::{ApiCache, CacheStats};
use crate::integrations::config::IntegrationConfig;
use crate::integrations::error::{IntegrationError, IntegrationResult};
use crate::integrations::retry::RetryPolicy;
use crate::integrations::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::integrations::types::{
    AddressValidation, CalendarEvent, DistanceResult, GeocodeResult, NewCalendarEvent, QuickBooksCustomer,
    SmsReceipt,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

// ===== 各调用点的缓存时长 =====
pub const GEOCODE_TTL: Duration = Duration::from_secs(10 * 60);
pub const ADDRESS_VALIDATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DISTANCE_TTL: Duration = Duration::from_secs(10 * 60);
pub const CALENDAR_EVENTS_TTL: Duration = Duration::from_secs(5 * 60);
pub const CONTACTS_TTL: Duration = Duration::from_secs(30 * 60);

type ResponseParser<T> = fn(&Value) -> IntegrationResult<T>;

pub struct ApiIntegrationManager {
    config: IntegrationConfig,
    transport: Arc<dyn HttpTransport>,
    cache: ApiCache,
    retry: RetryPolicy,
}

impl ApiIntegrationManager {
    pub fn new(config: IntegrationConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let retry = config.retry_policy();
        Self {
            config,
            transport,
            cache: ApiCache::new(),
            retry,
        }
    }

    /// 使用 reqwest 传输层
    pub fn with_reqwest(config: IntegrationConfig) -> IntegrationResult<Self> {
        Ok(Self::new(config, Arc::new(ReqwestTransport::new()?)))
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    // ==========================================
    // 缓存 + 重试
    // ==========================================

    /// 带缓存的请求
    ///
    /// # 参数
    /// - key: 缓存键（精确匹配）
    /// - ttl: 缓存时长
    /// - request_fn: 实际请求, 失败时按重试策略再次调用
    pub async fn make_request<T, F, Fut>(&self, key: &str, ttl: Duration, request_fn: F) -> IntegrationResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = IntegrationResult<T>>,
    {
        if let Some(cached) = self.cache.get(key) {
            debug!(key, "缓存命中");
            return Ok(serde_json::from_value(cached)?);
        }

        let data = self.retry.execute(request_fn).await?;
        self.cache.insert(key, serde_json::to_value(&data)?, ttl);
        debug!(key, ttl_secs = ttl.as_secs(), "已写入缓存");
        Ok(data)
    }

    /// 不缓存, 仅重试
    async fn send_with_retry<T>(&self, request: HttpRequest, parse: ResponseParser<T>) -> IntegrationResult<T> {
        self.retry.execute(|| self.send_once(request.clone(), parse)).await
    }

    async fn send_cached<T>(
        &self,
        key: &str,
        ttl: Duration,
        request: HttpRequest,
        parse: ResponseParser<T>,
    ) -> IntegrationResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.make_request(key, ttl, || self.send_once(request.clone(), parse))
            .await
    }

    async fn send_once<T>(&self, request: HttpRequest, parse: ResponseParser<T>) -> IntegrationResult<T> {
        let response = self.transport.send(request).await?;
        parse(&response)
    }

    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.cache.clear(pattern);
        info!(pattern = pattern.unwrap_or("*"), removed, "缓存已清理");
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ==========================================
    // 凭据
    // ==========================================

    fn maps_key(&self) -> IntegrationResult<&str> {
        self.config
            .google_maps_api_key
            .as_deref()
            .ok_or(IntegrationError::MissingApiKey("Google Maps"))
    }

    fn calendar_token(&self) -> IntegrationResult<&str> {
        self.config
            .google_calendar_token
            .as_deref()
            .ok_or(IntegrationError::MissingApiKey("Google Calendar"))
    }

    // ==========================================
    // Google Maps
    // ==========================================

    #[instrument(skip(self))]
    pub async fn geocode_address(&self, address: &str) -> IntegrationResult<GeocodeResult> {
        let request = HttpRequest::get(format!("{}/geocode/json", self.config.google_maps_base_url))
            .query("address", address)
            .query("key", self.maps_key()?);

        self.send_cached(&format!("geocode:{}", address), GEOCODE_TTL, request, GeocodeResult::from_google)
            .await
    }

    #[instrument(skip(self))]
    pub async fn validate_address(&self, address: &str) -> IntegrationResult<AddressValidation> {
        let request = HttpRequest::get(format!("{}/geocode/json", self.config.google_maps_base_url))
            .query("address", address)
            .query("key", self.maps_key()?);

        self.send_cached(
            &format!("validate_address:{}", address),
            ADDRESS_VALIDATION_TTL,
            request,
            AddressValidation::from_google,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn calculate_distance(&self, origin: &str, destination: &str) -> IntegrationResult<DistanceResult> {
        let request = HttpRequest::get(format!("{}/distancematrix/json", self.config.google_maps_base_url))
            .query("origins", origin)
            .query("destinations", destination)
            .query("units", "metric")
            .query("key", self.maps_key()?);

        self.send_cached(
            &format!("distance:{}|{}", origin, destination),
            DISTANCE_TTL,
            request,
            DistanceResult::from_google,
        )
        .await
    }

    // ==========================================
    // Google Calendar
    // ==========================================

    #[instrument(skip(self))]
    pub async fn get_calendar_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
    ) -> IntegrationResult<Vec<CalendarEvent>> {
        let request = HttpRequest::get(format!(
            "{}/calendars/{}/events",
            self.config.google_calendar_base_url, calendar_id
        ))
        .query("timeMin", time_min)
        .query("timeMax", time_max)
        .query("singleEvents", "true")
        .query("orderBy", "startTime")
        .bearer(self.calendar_token()?);

        self.send_cached(
            &format!("calendar:{}:{}:{}", calendar_id, time_min, time_max),
            CALENDAR_EVENTS_TTL,
            request,
            CalendarEvent::list_from_google,
        )
        .await
    }

    /// 创建事件后清除该日历的事件缓存
    #[instrument(skip(self, event), fields(summary = %event.summary))]
    pub async fn create_calendar_event(
        &self,
        calendar_id: &str,
        event: &NewCalendarEvent,
    ) -> IntegrationResult<CalendarEvent> {
        let request = HttpRequest::post(format!(
            "{}/calendars/{}/events",
            self.config.google_calendar_base_url, calendar_id
        ))
        .bearer(self.calendar_token()?)
        .json(event.to_google());

        let created = self.send_with_retry(request, CalendarEvent::from_google).await?;
        self.cache.clear(Some(&format!("calendar:{}:", calendar_id)));
        info!(event_id = %created.id, "日历事件已创建");
        Ok(created)
    }

    // ==========================================
    // QuickBooks
    // ==========================================

    #[instrument(skip(self))]
    pub async fn get_quickbooks_customers(&self) -> IntegrationResult<Vec<QuickBooksCustomer>> {
        let credentials = self
            .config
            .quickbooks
            .as_ref()
            .ok_or(IntegrationError::MissingApiKey("QuickBooks"))?;
        let request = HttpRequest::get(format!(
            "{}/company/{}/query",
            self.config.quickbooks_base_url, credentials.realm_id
        ))
        .query("query", "select * from Customer")
        .bearer(&credentials.access_token);

        self.send_cached(
            "quickbooks:customers",
            CONTACTS_TTL,
            request,
            QuickBooksCustomer::list_from_quickbooks,
        )
        .await
    }

    // ==========================================
    // Twilio
    // ==========================================

    #[instrument(skip(self, body))]
    pub async fn send_sms(&self, to: &str, body: &str) -> IntegrationResult<SmsReceipt> {
        let credentials = self
            .config
            .twilio
            .as_ref()
            .ok_or(IntegrationError::MissingApiKey("Twilio"))?;
        let request = HttpRequest::post(format!(
            "{}/Accounts/{}/Messages.json",
            self.config.twilio_base_url, credentials.account_sid
        ))
        .basic_auth(&credentials.account_sid, &credentials.auth_token)
        .form(&[("To", to), ("From", credentials.from_number.as_str()), ("Body", body)]);

        let receipt = self.send_with_retry(request, SmsReceipt::from_twilio).await?;
        info!(sid = %receipt.sid, status = %receipt.status, "短信已发送");
        Ok(receipt)
    }
}
