// ==========================================
// Agenda 导入 - 导入组件 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::import::{ImportMapping, ImportResult, RawGrid, RowRecord};
use crate::domain::types::EntityType;
use crate::importer::error::ImportOutcome;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// EntityImporter Trait
// ==========================================
// 用途: 表格 → 实体的导入主接口
// 实现者: EntityImporterImpl
#[async_trait]
pub trait EntityImporter: Send + Sync {
    /// 导入客户
    ///
    /// # 参数
    /// - grid: 原始表格（第 0 行为表头）
    /// - mapping: 列 key → 表头
    /// - skip_first_row: true 时从第 1 行开始读取数据
    ///
    /// # 返回
    /// - Ok(ImportResult): 行级错误/警告累积在结果中
    /// - Err: 仓储不可用等整体性失败
    async fn import_clients(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult>;

    /// 导入服务
    async fn import_services(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult>;

    /// 导入预约
    ///
    /// # 说明
    /// - 客户、服务列表在本次导入开始时各加载一次
    /// - 客户按邮箱匹配（不区分大小写）, 未匹配为行错误
    /// - 服务按名称匹配（不区分大小写）, 未匹配为警告
    async fn import_appointments(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult>;

    /// 按实体类型分发
    async fn import_entity(
        &self,
        entity: EntityType,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult> {
        match entity {
            EntityType::Client => self.import_clients(grid, mapping, skip_first_row).await,
            EntityType::Service => self.import_services(grid, mapping, skip_first_row).await,
            EntityType::Appointment => self.import_appointments(grid, mapping, skip_first_row).await,
        }
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格
    ///
    /// # 返回
    /// - Ok(RawGrid): 第 0 行为表头
    /// - Err: 文件缺失、为空、损坏或格式不支持
    fn parse_to_grid(&self, file_path: &Path) -> ImportOutcome<RawGrid>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 重复行检测（客户邮箱 / 服务名称）
// 实现者: DuplicateDetector
pub trait ConflictHandler: Send + Sync {
    /// 检测同一文件内的重复值
    ///
    /// # 返回
    /// - Vec<(行号, 值)>: 重复记录列表（不包括第一次出现）
    fn detect_duplicates(&self, records: &[RowRecord], key: &str) -> Vec<(usize, String)>;

    /// 检测与已有数据的重复
    ///
    /// # 参数
    /// - existing: 数据库中已存在的值
    fn detect_cross_batch_duplicates(
        &self,
        records: &[RowRecord],
        key: &str,
        existing: &[String],
    ) -> Vec<(usize, String)>;
}
