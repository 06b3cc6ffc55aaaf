// ==========================================
// Agenda 导入 - 服务领域模型
// ==========================================
// 对齐: services 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 品牌默认颜色（颜色缺失或非法时使用）
pub const DEFAULT_SERVICE_COLOR: &str = "#3B82F6";

/// 默认服务时长（分钟）
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,

    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64, // 15..=480
    pub price: f64,            // >= 0
    pub color: String,         // #RRGGBB 大写
    pub category: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
    pub color: String,
    pub category: Option<String>,
}

impl Default for NewService {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            price: 0.0,
            color: DEFAULT_SERVICE_COLOR.to_string(),
            category: None,
        }
    }
}
