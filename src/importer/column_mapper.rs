// ==========================================
// Agenda 导入 - 列映射器（表头自动识别）
// ==========================================
// 职责: 原始表头 → 导入列 key 的自动猜测
// 评分: 完全相同 1.0 / 互相包含 0.8 / 否则归一化 Levenshtein 相似度
// 约束: 不做一对一约束, 两个列可以认领同一个表头
// ==========================================

use crate::domain::import::{ImportColumn, ImportMapping};
use rapidfuzz::distance::levenshtein;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// 默认接受阈值（严格大于）
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;

pub const EXACT_MATCH_SCORE: f64 = 1.0;
pub const CONTAINS_MATCH_SCORE: f64 = 0.8;

// ==========================================
// ColumnMapper
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    threshold: f64,
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl ColumnMapper {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 根据表头行猜测列映射
    ///
    /// # 参数
    /// - grid: 原始表格（第 0 行为表头）
    /// - columns: 目标列定义
    ///
    /// # 返回
    /// - ImportMapping: 得分超过阈值的列 → 表头; 空表格返回空映射
    pub fn detect_columns<R: AsRef<[String]>>(
        &self,
        grid: &[R],
        columns: &[ImportColumn],
    ) -> ImportMapping {
        let mut mapping = ImportMapping::new();

        let Some(header_row) = grid.first() else {
            return mapping;
        };
        let headers: Vec<(&String, String)> = header_row
            .as_ref()
            .iter()
            .map(|h| (h, normalize_header(h)))
            .filter(|(_, normalized)| !normalized.is_empty())
            .collect();

        for column in columns {
            let keywords: Vec<String> = column.keywords.iter().map(|k| normalize_header(k)).collect();

            let mut best: Option<(&String, f64)> = None;
            for (raw, normalized) in &headers {
                let score = keywords
                    .iter()
                    .map(|keyword| similarity(normalized, keyword))
                    .fold(0.0_f64, f64::max);

                // 同分保留最左侧表头
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((raw, score));
                }
            }

            match best {
                Some((header, score)) if score > self.threshold => {
                    debug!(column = column.key, header = %header, score, "列映射命中");
                    mapping.set(column.key, header.trim());
                }
                Some((header, score)) => {
                    debug!(column = column.key, best_header = %header, score, "列映射未达阈值");
                }
                None => {}
            }
        }

        mapping
    }
}

/// 使用默认阈值的列映射
pub fn detect_columns<R: AsRef<[String]>>(grid: &[R], columns: &[ImportColumn]) -> ImportMapping {
    ColumnMapper::default().detect_columns(grid, columns)
}

// ==========================================
// 评分函数
// ==========================================

/// 表头归一化: 去音标 + 小写 + 非字母数字视为空格 + 合并空白
///
/// "Prénom" → "prenom", "Durée (minutes)" → "duree minutes", "E-mail" → "e mail"
pub fn normalize_header(value: &str) -> String {
    let folded: String = value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// U+0300..U+036F: 组合用音标
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// 两个已归一化字符串的相似度
pub fn similarity(header: &str, keyword: &str) -> f64 {
    if header.is_empty() || keyword.is_empty() {
        return 0.0;
    }
    if header == keyword {
        return EXACT_MATCH_SCORE;
    }
    if header.contains(keyword) || keyword.contains(header) {
        return CONTAINS_MATCH_SCORE;
    }

    let max_len = header.chars().count().max(keyword.chars().count());
    let distance = levenshtein::distance(header.chars(), keyword.chars());
    1.0 - distance as f64 / max_len as f64
}
