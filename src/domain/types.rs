// ==========================================
// Agenda 导入 - 领域类型定义
// ==========================================
// 职责: 实体类型 / 列类型 / 字段值 / 预约状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体类型 (Entity Type)
// ==========================================
// 每种实体对应一套静态导入列定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Client,
    Service,
    Appointment,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Client, EntityType::Service, EntityType::Appointment];

    /// 模板文件名（不含扩展名）
    pub fn template_name(&self) -> &'static str {
        match self {
            EntityType::Client => "modele_clients",
            EntityType::Service => "modele_services",
            EntityType::Appointment => "modele_rendez_vous",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Client => write!(f, "client"),
            EntityType::Service => write!(f, "service"),
            EntityType::Appointment => write!(f, "appointment"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" | "clients" => Ok(EntityType::Client),
            "service" | "services" => Ok(EntityType::Service),
            "appointment" | "appointments" | "rendez-vous" | "rdv" => Ok(EntityType::Appointment),
            other => Err(format!("type d'entité inconnu: {}", other)),
        }
    }
}

// ==========================================
// 列类型 (Column Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Email,
    Phone,
    PostalCode,
    Date,
    Time,
    Number,
    Color,
}

// ==========================================
// 字段值 (Field Value)
// ==========================================
// transform 的输出，按列类型归一化后的单元格值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Text(s) => s.parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Number(n) => Some(n.round() as i64),
            FieldValue::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

// ==========================================
// 预约状态 (Appointment Status)
// ==========================================
// 序列化格式: snake_case (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// 解析导入文件中的状态文本（法语/英语）
    ///
    /// 无法识别时返回 None，由调用方决定是否回退到默认值
    pub fn parse_label(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "scheduled" | "planifié" | "planifie" | "prévu" | "prevu" | "à venir" | "a venir" => {
                Some(AppointmentStatus::Scheduled)
            }
            "confirmed" | "confirmé" | "confirme" => Some(AppointmentStatus::Confirmed),
            "completed" | "terminé" | "termine" | "complété" | "complete" | "fait" => {
                Some(AppointmentStatus::Completed)
            }
            "cancelled" | "canceled" | "annulé" | "annule" => Some(AppointmentStatus::Cancelled),
            "no_show" | "no-show" | "no show" | "absent" | "absence" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_from_str() {
        assert_eq!("Clients".parse::<EntityType>(), Ok(EntityType::Client));
        assert_eq!("rdv".parse::<EntityType>(), Ok(EntityType::Appointment));
        assert!("factures".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(AppointmentStatus::parse_label(" Confirmé "), Some(AppointmentStatus::Confirmed));
        assert_eq!(AppointmentStatus::parse_label("annulé"), Some(AppointmentStatus::Cancelled));
        assert_eq!(AppointmentStatus::parse_label("???"), None);
        assert_eq!(AppointmentStatus::NoShow.to_string(), "no_show");
    }

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::Integer(60).as_f64(), Some(60.0));
        assert_eq!(FieldValue::Number(59.6).as_i64(), Some(60));
        assert_eq!(FieldValue::Text("abc".to_string()).as_text(), Some("abc"));
        assert_eq!(FieldValue::Text("abc".to_string()).as_i64(), None);
    }
}
