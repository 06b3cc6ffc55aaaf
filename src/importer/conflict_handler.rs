// ==========================================
// Agenda 导入 - 冲突处理器实现
// ==========================================
// 职责: 检测同文件内/与已有数据重复的客户邮箱、服务名称
// 比较: 去空白 + 不区分大小写; 空值不参与比较
// ==========================================

use crate::domain::import::RowRecord;
use crate::importer::importer_trait::ConflictHandler;
use std::collections::{HashMap, HashSet};

fn comparable(value: &str) -> String {
    value.trim().to_lowercase()
}

pub struct DuplicateDetector;

impl ConflictHandler for DuplicateDetector {
    fn detect_duplicates(&self, records: &[RowRecord], key: &str) -> Vec<(usize, String)> {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for record in records {
            let Some(value) = record.text(key) else {
                continue;
            };
            let normalized = comparable(&value);
            if first_occurrence.contains_key(&normalized) {
                duplicates.push((record.row_number, value));
            } else {
                first_occurrence.insert(normalized, record.row_number);
            }
        }

        duplicates
    }

    fn detect_cross_batch_duplicates(
        &self,
        records: &[RowRecord],
        key: &str,
        existing: &[String],
    ) -> Vec<(usize, String)> {
        let existing_set: HashSet<String> = existing.iter().map(|v| comparable(v)).collect();

        records
            .iter()
            .filter_map(|record| {
                let value = record.text(key)?;
                existing_set
                    .contains(&comparable(&value))
                    .then_some((record.row_number, value))
            })
            .collect()
    }
}
