// ==========================================
// Agenda 导入 - 核心库
// ==========================================
// 职责: 表格导入（客户 / 服务 / 预约）+ 外部接口缓存
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格文件
pub mod importer;

// 外部集成层 - 缓存 + 重试
pub mod integrations;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AppointmentStatus, ColumnType, EntityType, FieldValue};

// 领域实体
pub use domain::{
    Appointment, Client, ImportColumn, ImportMapping, ImportPhase, ImportProgress, ImportResult,
    NewAppointment, NewClient, NewService, Service,
};

// 导入
pub use importer::{
    detect_columns, generate_template, EntityImporter, EntityImporterImpl, ImportError, ImportPipeline,
    ImportReport, ProgressReporter,
};

// 外部集成
pub use integrations::{ApiIntegrationManager, IntegrationConfig, IntegrationError};

// 配置
pub use config::{ConfigManager, ImportSettings};

// 仓储
pub use repository::{EntityRepository, SqliteEntityRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Agenda";

/// 默认数据库路径
///
/// 优先使用 AGENDA_DB_PATH; 否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("AGENDA_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./agenda.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("agenda");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("agenda.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
