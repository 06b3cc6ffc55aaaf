// ==========================================
// Agenda 导入 - 文件导入流程
// ==========================================
// 流程: 解析文件 → 列映射（自动识别或调用方指定）→ 分块校验 → 分块写入
// 红线: 文件缺失/为空/损坏/格式不支持 → 整体失败; 行级问题累积在 ImportResult
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::import::{ImportMapping, ImportPhase, ImportProgress, ImportResult, RawGrid};
use crate::domain::types::EntityType;
use crate::importer::batch_importer::ProgressReporter;
use crate::importer::column_mapper::ColumnMapper;
use crate::importer::entity_importer::EntityImporterImpl;
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::FileParser;
use crate::importer::schemas::columns_for;
use crate::repository::EntityRepository;
use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, Span};
use uuid::Uuid;

/// 单个文件的导入报告
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub entity: EntityType,
    pub file_name: String,
    pub total_rows: usize,
    pub mapping: ImportMapping,
    pub result: ImportResult,
    pub elapsed_ms: u128,
}

// ==========================================
// ImportPipeline
// ==========================================
pub struct ImportPipeline {
    importer: EntityImporterImpl,
    file_parser: Box<dyn FileParser>,
    mapper: ColumnMapper,
}

impl ImportPipeline {
    pub fn new(repo: Arc<dyn EntityRepository>, settings: ImportSettings) -> Self {
        let mapper = ColumnMapper::new(settings.match_threshold);
        Self {
            importer: EntityImporterImpl::new(repo, settings),
            file_parser: Box::new(UniversalFileParser),
            mapper,
        }
    }

    /// 从配置表读取导入参数
    pub async fn from_config(
        repo: Arc<dyn EntityRepository>,
        config: &dyn ImportConfigReader,
    ) -> ImportOutcome<Self> {
        let settings = config
            .load_import_settings()
            .await
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        Ok(Self::new(repo, settings))
    }

    pub fn with_file_parser(mut self, file_parser: Box<dyn FileParser>) -> Self {
        self.file_parser = file_parser;
        self
    }

    pub fn importer(&self) -> &EntityImporterImpl {
        &self.importer
    }

    /// 解析文件并给出自动映射（不导入）
    pub fn preview(&self, file_path: &Path, entity: EntityType) -> ImportOutcome<(RawGrid, ImportMapping)> {
        let grid = self.file_parser.parse_to_grid(file_path)?;
        let mapping = self.mapper.detect_columns(&grid, columns_for(entity));
        Ok((grid, mapping))
    }

    /// 导入单个文件
    ///
    /// # 参数
    /// - file_path: .xlsx / .xls / .csv
    /// - entity: 目标实体
    /// - mapping_override: 调用方确认过的映射; None 时自动识别
    /// - progress: 进度通道
    #[instrument(skip(self, file_path, mapping_override, progress), fields(batch_id))]
    pub async fn import_file(
        &self,
        file_path: &Path,
        entity: EntityType,
        mapping_override: Option<ImportMapping>,
        progress: &ProgressReporter,
    ) -> ImportOutcome<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        info!(batch_id = %batch_id, file = %file_name, entity = %entity, "开始导入");

        // === 步骤 1: 解析文件 ===
        progress.report(ImportProgress::new(
            ImportPhase::Parsing,
            0,
            0,
            self.importer.messages().parsing(&file_name),
        ));
        let grid = self.file_parser.parse_to_grid(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        // === 步骤 2: 列映射 ===
        let mapping = match mapping_override {
            Some(mapping) => mapping,
            None => self.mapper.detect_columns(&grid, columns_for(entity)),
        };
        info!(mapped = mapping.len(), rows = grid.len(), "列映射完成");

        // === 步骤 3-4: 校验 + 写入 ===
        let validation = self
            .importer
            .validate_data_batch(entity, &grid, &mapping, true, progress)
            .await?;
        let total_rows = validation.total_rows;
        let result = self.importer.import_data_batch(validation, progress).await?;

        let elapsed_ms = start_time.elapsed().as_millis();
        info!(
            batch_id = %batch_id,
            total = total_rows,
            imported = result.imported,
            errors = result.errors.len(),
            elapsed_ms,
            "文件导入完成"
        );

        Ok(ImportReport {
            batch_id,
            entity,
            file_name,
            total_rows,
            mapping,
            result,
            elapsed_ms,
        })
    }

    /// 批量导入多个文件（并发执行, 单个文件失败不影响其他文件）
    pub async fn import_files<P: AsRef<Path>>(
        &self,
        file_paths: &[P],
        entity: EntityType,
    ) -> Vec<Result<ImportReport, String>> {
        info!(count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.iter().map(|path| {
            let path = path.as_ref();
            async move {
                self.import_file(path, entity, None, &ProgressReporter::silent())
                    .await
                    .map_err(|e| {
                        error!(file = %path.display(), error = %e, "文件导入失败");
                        format!("{} : {}", path.display(), e)
                    })
            }
        });
        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteEntityRepository;
    use std::io::Write;
    use tempfile::Builder;

    fn pipeline() -> (ImportPipeline, Arc<SqliteEntityRepository>) {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        (ImportPipeline::new(repo.clone(), ImportSettings::default()), repo)
    }

    #[tokio::test]
    async fn test_import_csv_with_detected_mapping() {
        let (pipeline, repo) = pipeline();
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "Prénom;Nom;Courriel;Téléphone\nMarie;Tremblay;marie@test.com;514 555 0123\nJean;;jean@test.com;\n"
        )
        .unwrap();

        let report = pipeline
            .import_file(file.path(), EntityType::Client, None, &ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.result.imported, 1);
        assert_eq!(report.result.errors, vec!["Ligne 3: Nom du famille requis".to_string()]);
        assert_eq!(report.mapping.get("phone"), Some("Téléphone"));

        let clients = repo.get_clients().await.unwrap();
        assert_eq!(clients[0].phone.as_deref(), Some("514-555-0123"));
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let (pipeline, _repo) = pipeline();
        let result = pipeline
            .import_file(Path::new("absent.xlsx"), EntityType::Service, None, &ProgressReporter::silent())
            .await;

        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_import_files_isolates_failures() {
        let (pipeline, _repo) = pipeline();
        let mut good = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(good, "Nom du service,Prix\nCoupe,40\n").unwrap();
        let bad = Builder::new().suffix(".txt").tempfile().unwrap();

        let results = pipeline
            .import_files(&[good.path(), bad.path()], EntityType::Service)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().result.imported, 1);
        assert!(results[1].is_err());
    }
}
