// ==========================================
// Agenda 导入 - 领域模型层
// ==========================================
// 职责: 定义实体、导入模型、基础类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod appointment;
pub mod client;
pub mod import;
pub mod service;
pub mod types;

// 重导出核心类型
pub use appointment::{Appointment, NewAppointment};
pub use client::{Client, NewClient};
pub use import::{
    ImportColumn, ImportMapping, ImportPhase, ImportProgress, ImportResult, RawGrid, RowRecord,
};
pub use service::{NewService, Service, DEFAULT_DURATION_MINUTES, DEFAULT_SERVICE_COLOR};
pub use types::{AppointmentStatus, ColumnType, EntityType, FieldValue};
