// ==========================================
// Agenda 导入 - 外部集成层
// ==========================================
// 职责: 地理编码 / 日历 / 短信 / 会计系统的出站调用
// 公共能力: TTL 缓存 + 线性退避重试
// ==========================================

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod retry;
pub mod transport;
pub mod types;

pub use cache::{ApiCache, CacheStats};
pub use config::IntegrationConfig;
pub use error::{IntegrationError, IntegrationResult};
pub use manager::ApiIntegrationManager;
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport};
pub use types::{
    AddressValidation, CalendarEvent, DistanceResult, GeocodeResult, NewCalendarEvent, QuickBooksCustomer,
    SmsReceipt,
};
