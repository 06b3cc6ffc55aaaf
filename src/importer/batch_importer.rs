// ==========================================
// Agenda 导入 - 分块批量导入
// ==========================================
// 校验: 每块 validate_chunk_size 行（默认 100）, 全部校验完成后才开始写入
// 写入: 每块 import_chunk_size 行（默认 50）, 块内并发创建, 结果按行号顺序汇总
// 进度: tokio mpsc 通道推送 ImportProgress; 接收端关闭不影响导入
// ==========================================

use crate::domain::import::{ImportMapping, ImportPhase, ImportProgress, ImportResult};
use crate::domain::types::EntityType;
use crate::importer::draft::ValidatedRow;
use crate::importer::entity_importer::{EntityImporterImpl, ResultCollector};
use crate::importer::error::ImportOutcome;
use crate::importer::row_validator::{first_data_row, RowCheck, RowValidator, ValidationMode};
use crate::importer::schemas::columns_for;
use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument};

pub type ProgressSender = UnboundedSender<ImportProgress>;

// ==========================================
// ProgressReporter
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<ProgressSender>,
}

impl ProgressReporter {
    pub fn new(sender: Option<ProgressSender>) -> Self {
        Self { sender }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, progress: ImportProgress) {
        if let Some(sender) = &self.sender {
            // 接收端已关闭时忽略
            if sender.send(progress).is_err() {
                debug!("进度接收端已关闭");
            }
        }
    }
}

/// 批量校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValidation {
    pub entity: EntityType,
    pub total_rows: usize,
    pub rows: Vec<ValidatedRow>,
}

impl BatchValidation {
    pub fn ready_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_ready()).count()
    }
}

impl EntityImporterImpl {
    /// 分块校验全部数据行（不落库）
    ///
    /// 每行记录全部失败; 每块结束推送一次 Validating 进度并让出调度
    #[instrument(skip(self, grid, mapping, progress), fields(rows = grid.len()))]
    pub async fn validate_data_batch(
        &self,
        entity: EntityType,
        grid: &[Vec<String>],
        mapping: &ImportMapping,
        skip_first_row: bool,
        progress: &ProgressReporter,
    ) -> ImportOutcome<BatchValidation> {
        let Some(headers) = grid.first() else {
            return Ok(BatchValidation {
                entity,
                total_rows: 0,
                rows: Vec::new(),
            });
        };

        let columns = columns_for(entity);
        self.log_mapping(entity, columns, mapping);

        let start = first_data_row(skip_first_row).min(grid.len());
        let data_rows = &grid[start..];
        let total = data_rows.len();
        let chunk_size = self.settings.validate_chunk_size.max(1);

        let validator = RowValidator::new(columns, headers, mapping, &self.messages)
            .skip_blank_rows(self.settings.skip_blank_rows);
        let mut checks: Vec<(usize, RowCheck)> = Vec::with_capacity(total);
        let mut processed = 0;
        for chunk in data_rows.chunks(chunk_size) {
            for row in chunk {
                let row_number = start + processed + 1;
                checks.push((
                    row_number,
                    validator.validate_row(row, row_number, ValidationMode::Exhaustive),
                ));
                processed += 1;
            }

            progress.report(ImportProgress::new(
                ImportPhase::Validating,
                processed,
                total,
                self.messages.validating(processed, total),
            ));
            tokio::task::yield_now().await;
        }

        let rows = self.resolve(entity, checks).await?;
        debug!(entity = %entity, total, ready = rows.iter().filter(|r| r.is_ready()).count(), "批量校验完成");

        Ok(BatchValidation {
            entity,
            total_rows: total,
            rows,
        })
    }

    /// 分块写入已校验的行
    #[instrument(skip(self, validation, progress), fields(entity = %validation.entity, rows = validation.total_rows))]
    pub async fn import_data_batch(
        &self,
        validation: BatchValidation,
        progress: &ProgressReporter,
    ) -> ImportOutcome<ImportResult> {
        let total = validation.total_rows;
        let chunk_size = self.settings.import_chunk_size.max(1);
        let mut collector = ResultCollector::new(&self.messages);
        let mut processed = 0;

        let mut rows = validation.rows.into_iter().peekable();
        while rows.peek().is_some() {
            let chunk: Vec<ValidatedRow> = rows.by_ref().take(chunk_size).collect();

            let creates = chunk.iter().map(|row| async move {
                match &row.outcome {
                    Ok(draft) => Some(self.persist(draft).await),
                    Err(_) => None,
                }
            });
            let results = join_all(creates).await;

            processed += chunk.len();
            for (row, created) in chunk.into_iter().zip(results) {
                collector.record(row, created);
            }

            progress.report(ImportProgress::new(
                ImportPhase::Importing,
                processed,
                total,
                self.messages.importing(processed, total),
            ));
        }

        progress.report(ImportProgress::new(
            ImportPhase::Completed,
            total,
            total,
            self.messages
                .completed(collector.imported_so_far(), collector.errors_so_far()),
        ));

        let result = collector.finish();
        info!(
            entity = %validation.entity,
            imported = result.imported,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            skipped = result.skipped,
            duplicates = result.duplicates,
            "批量导入完成"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportSettings;
    use crate::repository::{EntityRepository, SqliteEntityRepository};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn client_grid(rows: usize) -> Vec<Vec<String>> {
        let mut grid = vec![vec!["Nom".to_string(), "Prénom".to_string(), "Courriel".to_string()]];
        for i in 0..rows {
            grid.push(vec![
                format!("Nom{}", i),
                format!("Prenom{}", i),
                format!("client{}@test.com", i),
            ]);
        }
        grid
    }

    fn mapping() -> ImportMapping {
        ImportMapping::from_pairs([("last_name", "Nom"), ("first_name", "Prénom"), ("email", "Courriel")])
    }

    #[tokio::test]
    async fn test_batch_progress_events() {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let importer = EntityImporterImpl::new(repo.clone(), ImportSettings::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ProgressReporter::new(Some(tx));

        let grid = client_grid(120);
        let validation = importer
            .validate_data_batch(EntityType::Client, &grid, &mapping(), true, &progress)
            .await
            .unwrap();
        assert_eq!(validation.total_rows, 120);
        assert_eq!(validation.ready_rows(), 120);

        let result = importer.import_data_batch(validation, &progress).await.unwrap();
        drop(progress);

        assert!(result.success);
        assert_eq!(result.imported, 120);
        assert_eq!(repo.get_clients().await.unwrap().len(), 120);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        // 校验 2 块（100 + 20）, 写入 3 块（50 + 50 + 20）, 最后一条完成
        let phases: Vec<ImportPhase> = events.iter().map(|e| e.phase).collect();
        assert_eq!(
            phases,
            vec![
                ImportPhase::Validating,
                ImportPhase::Validating,
                ImportPhase::Importing,
                ImportPhase::Importing,
                ImportPhase::Importing,
                ImportPhase::Completed,
            ]
        );
        assert_eq!(events[0].current, 100);
        assert_eq!(events[0].percentage, 83);
        assert_eq!(events[3].current, 100);
        assert_eq!(events.last().unwrap().percentage, 100);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_fail() {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let importer = EntityImporterImpl::new(repo, ImportSettings::default());
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let progress = ProgressReporter::new(Some(tx));

        let grid = client_grid(3);
        let validation = importer
            .validate_data_batch(EntityType::Client, &grid, &mapping(), true, &progress)
            .await
            .unwrap();
        let result = importer.import_data_batch(validation, &progress).await.unwrap();

        assert_eq!(result.imported, 3);
    }

    #[tokio::test]
    async fn test_batch_validation_reports_every_failure() {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let importer = EntityImporterImpl::new(repo.clone(), ImportSettings::default());

        let grid = vec![
            vec!["Nom".to_string(), "Prénom".to_string(), "Courriel".to_string()],
            vec!["".to_string(), "".to_string(), "a@test.com".to_string()],
            vec!["Martin".to_string(), "Jean".to_string(), "jean@test.com".to_string()],
        ];
        let validation = importer
            .validate_data_batch(EntityType::Client, &grid, &mapping(), true, &ProgressReporter::silent())
            .await
            .unwrap();
        let result = importer
            .import_data_batch(validation, &ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(result.imported, 1);
        assert_eq!(
            result.errors,
            vec![
                "Ligne 2: Prénom requis".to_string(),
                "Ligne 2: Nom du famille requis".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_small_chunks_keep_row_order() {
        let repo = Arc::new(SqliteEntityRepository::in_memory().unwrap());
        let settings = ImportSettings {
            validate_chunk_size: 2,
            import_chunk_size: 2,
            ..Default::default()
        };
        let importer = EntityImporterImpl::new(repo, settings);

        let mut grid = client_grid(5);
        grid[2][0].clear();
        grid[4][0].clear();

        let validation = importer
            .validate_data_batch(EntityType::Client, &grid, &mapping(), true, &ProgressReporter::silent())
            .await
            .unwrap();
        let result = importer
            .import_data_batch(validation, &ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(result.imported, 3);
        assert_eq!(
            result.errors,
            vec![
                "Ligne 3: Nom du famille requis".to_string(),
                "Ligne 5: Nom du famille requis".to_string()
            ]
        );
    }
}
