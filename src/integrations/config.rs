// ==========================================
// Agenda 导入 - 外部集成配置
// ==========================================
// 来源: 环境变量（启动时读取 .env）
// 缺少某个服务的密钥时, 该服务的调用直接返回 MissingApiKey
// ==========================================

use crate::integrations::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use std::time::Duration;

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const QUICKBOOKS_BASE_URL: &str = "https://quickbooks.api.intuit.com/v3";
pub const TWILIO_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// 环境变量名
pub mod env_keys {
    pub const GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
    pub const GOOGLE_CALENDAR_TOKEN: &str = "GOOGLE_CALENDAR_TOKEN";
    pub const QUICKBOOKS_TOKEN: &str = "QUICKBOOKS_TOKEN";
    pub const QUICKBOOKS_REALM_ID: &str = "QUICKBOOKS_REALM_ID";
    pub const TWILIO_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
    pub const TWILIO_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
    pub const TWILIO_FROM_NUMBER: &str = "TWILIO_FROM_NUMBER";
    pub const RETRY_ATTEMPTS: &str = "INTEGRATION_RETRY_ATTEMPTS";
    pub const RETRY_DELAY_MS: &str = "INTEGRATION_RETRY_DELAY_MS";
}

#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct QuickBooksCredentials {
    pub access_token: String,
    pub realm_id: String,
}

#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub google_maps_api_key: Option<String>,
    pub google_calendar_token: Option<String>,
    pub quickbooks: Option<QuickBooksCredentials>,
    pub twilio: Option<TwilioCredentials>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,

    pub google_maps_base_url: String,
    pub google_calendar_base_url: String,
    pub quickbooks_base_url: String,
    pub twilio_base_url: String,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            google_maps_api_key: None,
            google_calendar_token: None,
            quickbooks: None,
            twilio: None,
            retry_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            google_maps_base_url: GOOGLE_MAPS_BASE_URL.to_string(),
            google_calendar_base_url: GOOGLE_CALENDAR_BASE_URL.to_string(),
            quickbooks_base_url: QUICKBOOKS_BASE_URL.to_string(),
            twilio_base_url: TWILIO_BASE_URL.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl IntegrationConfig {
    /// 从进程环境读取（先加载 .env, 文件不存在时忽略）
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let defaults = Self::default();

        let quickbooks = match (get(env_keys::QUICKBOOKS_TOKEN), get(env_keys::QUICKBOOKS_REALM_ID)) {
            (Some(access_token), Some(realm_id)) => Some(QuickBooksCredentials {
                access_token,
                realm_id,
            }),
            _ => None,
        };
        let twilio = match (
            get(env_keys::TWILIO_ACCOUNT_SID),
            get(env_keys::TWILIO_AUTH_TOKEN),
            get(env_keys::TWILIO_FROM_NUMBER),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioCredentials {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Self {
            google_maps_api_key: get(env_keys::GOOGLE_MAPS_API_KEY),
            google_calendar_token: get(env_keys::GOOGLE_CALENDAR_TOKEN),
            quickbooks,
            twilio,
            retry_attempts: get(env_keys::RETRY_ATTEMPTS)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_attempts),
            retry_delay: get(env_keys::RETRY_DELAY_MS)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            ..defaults
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }
}
