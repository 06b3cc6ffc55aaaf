// ==========================================
// Agenda 导入 - 客户领域模型
// ==========================================
// 用途: 导入层写入, 预约导入时按邮箱匹配
// 对齐: clients 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Client - 客户（已持久化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String, // UUID v4

    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,       // 已小写
    pub phone: Option<String>,       // NNN-NNN-NNNN
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>, // "AAA BBB"
    pub notes: Option<String>,
    pub loyalty_points: i64,

    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==========================================
// NewClient - 待创建客户
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub loyalty_points: i64,
}
