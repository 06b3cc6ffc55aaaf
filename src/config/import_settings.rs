// ==========================================
// Agenda 导入 - 导入参数
// ==========================================

use crate::i18n::DEFAULT_LOCALE;
use crate::importer::column_mapper::DEFAULT_MATCH_THRESHOLD;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VALIDATE_CHUNK_SIZE: usize = 100;
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub locale: String,
    pub match_threshold: f64,
    pub validate_chunk_size: usize,
    pub import_chunk_size: usize,
    pub skip_duplicates: bool,
    /// 整行空白时跳过（计入 skipped）; 关闭时按普通行校验必填列
    pub skip_blank_rows: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            validate_chunk_size: DEFAULT_VALIDATE_CHUNK_SIZE,
            import_chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
            skip_duplicates: true,
            skip_blank_rows: false,
        }
    }
}

impl ImportSettings {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}
