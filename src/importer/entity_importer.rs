// ==========================================
// Agenda 导入 - 实体导入器实现
// ==========================================
// 流程:
// 1. 行校验（FailFast）
// 2. 加载查找表 + 重复检测 + 实体构建
// 3. 按行号顺序逐行创建; 创建失败记录为行错误并继续
// ==========================================

use crate::config::ImportSettings;
use crate::domain::import::{ImportColumn, ImportMapping, ImportResult};
use crate::domain::types::EntityType;
use crate::importer::conflict_handler::DuplicateDetector;
use crate::importer::draft::{EntityDraft, ImportContext, RowRejection, ValidatedRow};
use crate::importer::error::ImportOutcome;
use crate::importer::importer_trait::{ConflictHandler, EntityImporter};
use crate::importer::messages::RowMessages;
use crate::importer::row_validator::{first_data_row, RowCheck, RowValidator, ValidationMode};
use crate::importer::schemas::columns_for;
use crate::repository::{EntityRepository, RepositoryResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// EntityImporterImpl
// ==========================================
pub struct EntityImporterImpl {
    pub(crate) repo: Arc<dyn EntityRepository>,
    pub(crate) conflict_handler: Box<dyn ConflictHandler>,
    pub(crate) settings: ImportSettings,
    pub(crate) messages: RowMessages,
}

impl EntityImporterImpl {
    pub fn new(repo: Arc<dyn EntityRepository>, settings: ImportSettings) -> Self {
        let messages = RowMessages::new(settings.locale.clone());
        Self {
            repo,
            conflict_handler: Box::new(DuplicateDetector),
            settings,
            messages,
        }
    }

    pub fn with_conflict_handler(mut self, conflict_handler: Box<dyn ConflictHandler>) -> Self {
        self.conflict_handler = conflict_handler;
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn messages(&self) -> &RowMessages {
        &self.messages
    }

    /// 映射检查（只记录日志, 不中断）
    pub(crate) fn log_mapping(&self, entity: EntityType, columns: &[ImportColumn], mapping: &ImportMapping) {
        let missing = mapping.missing_required(columns);
        if !missing.is_empty() {
            warn!(entity = %entity, missing = ?missing, "必填列未映射，所有数据行将被拒绝");
        }
        for (header, keys) in mapping.duplicate_claims() {
            debug!(entity = %entity, header = %header, keys = ?keys, "同一表头被多个列认领");
        }
    }

    /// 行校验 + 查找表 + 实体构建
    pub(crate) async fn prepare(
        &self,
        entity: EntityType,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
        mode: ValidationMode,
    ) -> ImportOutcome<Vec<ValidatedRow>> {
        let Some(headers) = grid.first() else {
            return Ok(Vec::new());
        };
        let columns = columns_for(entity);
        self.log_mapping(entity, columns, mapping);

        let validator = RowValidator::new(columns, headers, mapping, &self.messages)
            .skip_blank_rows(self.settings.skip_blank_rows);
        let checks: Vec<(usize, RowCheck)> = grid
            .iter()
            .enumerate()
            .skip(first_data_row(skip_first_row))
            .map(|(index, row)| (index + 1, validator.validate_row(row, index + 1, mode)))
            .collect();

        self.resolve(entity, checks).await
    }

    /// 校验结果 → ValidatedRow（需要仓储查找表）
    pub(crate) async fn resolve(
        &self,
        entity: EntityType,
        checks: Vec<(usize, RowCheck)>,
    ) -> ImportOutcome<Vec<ValidatedRow>> {
        let context = ImportContext::load(self.repo.as_ref(), entity, self.settings.skip_duplicates).await?;
        Ok(context.resolve(checks, self.conflict_handler.as_ref(), &self.messages))
    }

    /// 创建单个实体
    pub(crate) async fn persist(&self, draft: &EntityDraft) -> RepositoryResult<()> {
        match draft.clone() {
            EntityDraft::Client(client) => self.repo.create_client(client).await.map(|_| ()),
            EntityDraft::Service(service) => self.repo.create_service(service).await.map(|_| ()),
            EntityDraft::Appointment(appt) => self.repo.create_appointment(appt).await.map(|_| ()),
        }
    }

    /// 逐行顺序导入
    async fn run_sequential(
        &self,
        entity: EntityType,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult> {
        let rows = self
            .prepare(entity, grid, mapping, skip_first_row, ValidationMode::FailFast)
            .await?;

        let mut collector = ResultCollector::new(&self.messages);
        for row in rows {
            let created = match &row.outcome {
                Ok(draft) => Some(self.persist(draft).await),
                Err(_) => None,
            };
            collector.record(row, created);
        }

        let result = collector.finish();
        info!(
            entity = %entity,
            imported = result.imported,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            skipped = result.skipped,
            duplicates = result.duplicates,
            "导入完成"
        );
        Ok(result)
    }
}

#[async_trait]
impl EntityImporter for EntityImporterImpl {
    #[instrument(skip_all, fields(rows = grid.len()))]
    async fn import_clients(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult> {
        self.run_sequential(EntityType::Client, grid, mapping, skip_first_row).await
    }

    #[instrument(skip_all, fields(rows = grid.len()))]
    async fn import_services(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult> {
        self.run_sequential(EntityType::Service, grid, mapping, skip_first_row).await
    }

    #[instrument(skip_all, fields(rows = grid.len()))]
    async fn import_appointments(
        &self,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
    ) -> ImportOutcome<ImportResult> {
        self.run_sequential(EntityType::Appointment, grid, mapping, skip_first_row).await
    }
}

// ==========================================
// ResultCollector - 按行号顺序汇总
// ==========================================
pub(crate) struct ResultCollector<'a> {
    result: ImportResult,
    messages: &'a RowMessages,
}

impl<'a> ResultCollector<'a> {
    pub(crate) fn new(messages: &'a RowMessages) -> Self {
        Self {
            result: ImportResult::default(),
            messages,
        }
    }

    /// # 参数
    /// - created: None 表示该行未尝试创建
    pub(crate) fn record(&mut self, row: ValidatedRow, created: Option<RepositoryResult<()>>) {
        self.result.warnings.extend(row.warnings);

        match (row.outcome, created) {
            (Err(RowRejection::Blank), _) => self.result.skipped += 1,
            (Err(RowRejection::Duplicate), _) => self.result.duplicates += 1,
            (Err(RowRejection::Invalid(errors)), _) => self.result.errors.extend(errors),
            (Ok(_), Some(Ok(()))) => self.result.imported += 1,
            (Ok(_), Some(Err(e))) => {
                warn!(row = row.row_number, error = %e, "行创建失败");
                self.result
                    .errors
                    .push(self.messages.row_failed(row.row_number, &e.to_string()));
            }
            (Ok(_), None) => {}
        }
    }

    pub(crate) fn errors_so_far(&self) -> usize {
        self.result.errors.len()
    }

    pub(crate) fn imported_so_far(&self) -> usize {
        self.result.imported
    }

    pub(crate) fn finish(self) -> ImportResult {
        self.result.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteEntityRepository;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn importer() -> (EntityImporterImpl, Arc<SqliteEntityRepository>) {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let importer = EntityImporterImpl::new(repo.clone(), ImportSettings::default());
        (importer, repo)
    }

    #[tokio::test]
    async fn test_required_last_name_scenario() {
        let (importer, repo) = importer();
        let g = grid(&[
            &["Nom", "Prenom", "Email"],
            &["", "Marie", "marie@test.com"],
            &["Martin", "Jean", "jean@test.com"],
        ]);
        let mapping =
            ImportMapping::from_pairs([("last_name", "Nom"), ("first_name", "Prenom"), ("email", "Email")]);

        let result = importer.import_clients(&g, &mapping, true).await.unwrap();

        assert_eq!(result.imported, 1);
        assert_eq!(result.errors, vec!["Ligne 2: Nom du famille requis".to_string()]);
        assert!(!result.success);

        let clients = repo.get_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].last_name, "Martin");
    }

    #[tokio::test]
    async fn test_services_with_duplicates_and_blank_rows() {
        let (importer, _repo) = importer();
        let g = grid(&[
            &["Nom du service", "Durée", "Prix", "Couleur"],
            &["Coupe", "45", "40,00 $", "#ff0000"],
            &["", "", "", ""],
            &["coupe", "30", "", ""],
            &["Couleur", "1000", "abc", "rouge"],
        ]);
        let mapping = ImportMapping::from_pairs([
            ("name", "Nom du service"),
            ("duration", "Durée"),
            ("price", "Prix"),
            ("color", "Couleur"),
        ]);

        let result = importer.import_services(&g, &mapping, true).await.unwrap();

        // 空白行按普通行校验
        assert!(!result.success);
        assert_eq!(result.imported, 2);
        assert_eq!(result.errors, vec!["Ligne 3: Nom du service requis".to_string()]);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.duplicates, 1);
        // 价格 "abc" 与颜色 "rouge" 两条警告 + 一条重复警告
        assert_eq!(result.warnings.len(), 3);

        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let settings = ImportSettings {
            skip_blank_rows: true,
            ..Default::default()
        };
        let importer = EntityImporterImpl::new(repo, settings);
        let result = importer.import_services(&g, &mapping, true).await.unwrap();

        assert!(result.success);
        assert_eq!(result.imported, 2);
        assert_eq!(result.skipped, 1);
    }

    #[tokio::test]
    async fn test_blank_middle_row_is_a_required_error() {
        let (importer, repo) = importer();
        let g = grid(&[
            &["Nom", "Prenom", "Email"],
            &["", "", ""],
            &["Martin", "Jean", "jean@test.com"],
        ]);
        let mapping =
            ImportMapping::from_pairs([("last_name", "Nom"), ("first_name", "Prenom"), ("email", "Email")]);

        let result = importer.import_clients(&g, &mapping, true).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.errors, vec!["Ligne 2: Prénom requis".to_string()]);
        assert_eq!(repo.get_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_is_recorded_and_run_continues() {
        let (importer, repo) = importer();
        repo.create_client(crate::domain::NewClient {
            first_name: "Marie".to_string(),
            last_name: "Tremblay".to_string(),
            email: Some("marie@test.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let g = grid(&[
            &["Courriel du client", "Date", "Heure", "Service"],
            &["marie@test.com", "2025-03-14", "14:30", "Inconnu"],
            &["absent@test.com", "2025-03-14", "15:30", ""],
            &["MARIE@TEST.COM", "14/03/2025", "16h", ""],
        ]);
        let mapping = ImportMapping::from_pairs([
            ("client_email", "Courriel du client"),
            ("date", "Date"),
            ("start_time", "Heure"),
            ("service_name", "Service"),
        ]);

        let result = importer.import_appointments(&g, &mapping, true).await.unwrap();

        assert_eq!(result.imported, 2);
        assert_eq!(result.errors, vec!["Ligne 3: client introuvable (absent@test.com)".to_string()]);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Ligne 2: service introuvable"));

        let appointments = repo.get_appointments().await.unwrap();
        assert_eq!(appointments.len(), 2);
        assert!(appointments.iter().all(|a| a.service_id.is_none() && a.duration_minutes == 60));
    }

    #[tokio::test]
    async fn test_empty_grid_imports_nothing() {
        let (importer, _repo) = importer();
        let result = importer
            .import_clients(&[], &ImportMapping::new(), true)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.imported, 0);
    }
}
