// ==========================================
// Agenda 导入 - 导入层
// ==========================================
// 职责: 表格文件 → 客户 / 服务 / 预约
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod batch_importer;
pub mod column_mapper;
pub mod conflict_handler;
pub mod draft;
pub mod entity_importer;
pub mod error;
pub mod field_rules;
pub mod file_parser;
pub mod importer_trait;
pub mod messages;
pub mod pipeline;
pub mod row_validator;
pub mod schemas;
pub mod template;

// 重导出核心类型
pub use batch_importer::{BatchValidation, ProgressReporter, ProgressSender};
pub use column_mapper::{detect_columns, normalize_header, similarity, ColumnMapper, DEFAULT_MATCH_THRESHOLD};
pub use conflict_handler::DuplicateDetector;
pub use draft::{EntityDraft, RowRejection, ValidatedRow};
pub use entity_importer::EntityImporterImpl;
pub use error::{ImportError, ImportOutcome};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use messages::RowMessages;
pub use pipeline::{ImportPipeline, ImportReport};
pub use row_validator::{validate_rows, RowCheck, RowValidator, ValidationMode, ValidationReport};
pub use schemas::{appointment_columns, client_columns, columns_for, service_columns};
pub use template::{generate_template, template_bytes, template_grid};

// 重导出 Trait 接口
pub use importer_trait::{ConflictHandler, EntityImporter, FileParser};
