// ==========================================
// Agenda 导入 - 导入领域模型
// ==========================================
// 职责: 导入列定义 / 列映射 / 导入结果 / 进度事件
// 生命周期: ImportColumn 静态; ImportMapping 每个导入会话一份;
//           ImportResult 每次导入运行一份
// ==========================================

use crate::domain::types::{ColumnType, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 原始表格: 行 × 单元格, 第 0 行约定为表头
pub type RawGrid = Vec<Vec<String>>;

// ==========================================
// ImportColumn - 导入列定义
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ImportColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub column_type: ColumnType,
    pub example: &'static str,
    /// 表头匹配用的同义词（法语/英语），与 key 无关
    pub keywords: &'static [&'static str],
    pub validation: fn(&str) -> bool,
    pub transform: fn(&str) -> FieldValue,
}

impl ImportColumn {
    pub fn validate(&self, value: &str) -> bool {
        (self.validation)(value)
    }

    pub fn apply(&self, value: &str) -> FieldValue {
        (self.transform)(value)
    }
}

// ==========================================
// ImportMapping - 列映射 (column key → 原始表头)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportMapping(BTreeMap<String, String>);

impl ImportMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 (column key, 表头) 对构造
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// 设置映射（空表头等同于取消映射）
    pub fn set(&mut self, key: impl Into<String>, header: impl Into<String>) {
        let key = key.into();
        let header = header.into();
        if header.trim().is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, header);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|h| !h.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 未映射的必填列 key
    pub fn missing_required(&self, columns: &[ImportColumn]) -> Vec<&'static str> {
        columns
            .iter()
            .filter(|c| c.required && !self.contains(c.key))
            .map(|c| c.key)
            .collect()
    }

    /// 被多个列同时占用的表头 → 占用它的列 key
    pub fn duplicate_claims(&self) -> BTreeMap<String, Vec<String>> {
        let mut by_header: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, header) in &self.0 {
            by_header.entry(header.clone()).or_default().push(key.clone());
        }
        by_header.retain(|_, keys| keys.len() > 1);
        by_header
    }
}

// ==========================================
// RowRecord - 单行校验通过后的字段集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    pub row_number: usize, // 1-indexed 表格行号
    pub fields: HashMap<&'static str, FieldValue>,
}

impl RowRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: HashMap::new(),
        }
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|v| v.to_string())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(FieldValue::as_f64)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(FieldValue::as_i64)
    }
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub skipped: usize,    // 空白行
    pub duplicates: usize, // 重复行（跳过）
}

impl ImportResult {
    /// 汇总完成: success = 无错误
    pub fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

// ==========================================
// 进度事件
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Parsing,
    Validating,
    Importing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: u8, // 0..=100
    pub phase: ImportPhase,
    pub message: String,
}

impl ImportProgress {
    pub fn new(phase: ImportPhase, current: usize, total: usize, message: impl Into<String>) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((current.min(total) * 100) / total) as u8
        };
        Self {
            current,
            total,
            percentage,
            phase,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_set_empty_header_unmaps() {
        let mut mapping = ImportMapping::from_pairs([("last_name", "Nom")]);
        assert!(mapping.contains("last_name"));

        mapping.set("last_name", "  ");
        assert!(!mapping.contains("last_name"));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_mapping_duplicate_claims() {
        let mapping = ImportMapping::from_pairs([
            ("first_name", "Nom complet"),
            ("last_name", "Nom complet"),
            ("email", "Courriel"),
        ]);

        let claims = mapping.duplicate_claims();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims["Nom complet"], vec!["first_name".to_string(), "last_name".to_string()]);
    }

    #[test]
    fn test_mapping_serializes_as_plain_object() {
        let mapping = ImportMapping::from_pairs([("email", "Courriel")]);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"email":"Courriel"}"#);
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(ImportProgress::new(ImportPhase::Validating, 50, 200, "").percentage, 25);
        assert_eq!(ImportProgress::new(ImportPhase::Importing, 0, 0, "").percentage, 100);
        assert_eq!(ImportProgress::new(ImportPhase::Importing, 300, 200, "").percentage, 100);
    }

    #[test]
    fn test_result_finish() {
        let result = ImportResult {
            imported: 2,
            errors: vec!["Ligne 3: x".to_string()],
            ..Default::default()
        }
        .finish();
        assert!(!result.success);
        assert!(ImportResult::default().finish().success);
    }
}
