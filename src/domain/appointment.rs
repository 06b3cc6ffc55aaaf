// ==========================================
// Agenda 导入 - 预约领域模型
// ==========================================
// 红线: client_id 必须存在; service_id 允许为空（导入时服务未匹配）
// 对齐: appointments 表
// ==========================================

use crate::domain::types::AppointmentStatus;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,

    pub client_id: String,
    pub service_id: Option<String>,

    pub start_at: NaiveDateTime, // 本地时间
    pub end_at: NaiveDateTime,   // start_at + duration
    pub duration_minutes: i64,

    pub status: AppointmentStatus,
    pub price: Option<f64>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: String,
    pub service_id: Option<String>,
    pub start_at: NaiveDateTime,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub price: Option<f64>,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn end_at(&self) -> NaiveDateTime {
        self.start_at + Duration::minutes(self.duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_end_at_adds_duration() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        let appt = NewAppointment {
            client_id: "c1".to_string(),
            service_id: None,
            start_at: start,
            duration_minutes: 90,
            status: AppointmentStatus::Scheduled,
            price: None,
            notes: None,
        };

        assert_eq!(
            appt.end_at(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap().and_hms_opt(1, 0, 0).unwrap()
        );
    }
}
