// ==========================================
// Agenda 导入 - 行级消息
// ==========================================
// 所有行级错误/警告/进度文本集中在此, 通过 rust-i18n 按指定语言渲染
// 行号为 1 起始的表格行号
// ==========================================

use crate::domain::import::ImportColumn;
use crate::i18n::{t_in, DEFAULT_LOCALE};

#[derive(Debug, Clone)]
pub struct RowMessages {
    locale: String,
}

impl Default for RowMessages {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl RowMessages {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn render(&self, key: &str, args: &[(&str, &str)]) -> String {
        t_in(&self.locale, key, args)
    }

    /// 列名: 法语直接使用列定义的 label（同时是模板表头）, 其它语言查 columns.<key>, 缺失时回退 label
    pub fn column_label(&self, column: &ImportColumn) -> String {
        if self.locale == DEFAULT_LOCALE {
            return column.label.to_string();
        }
        let key = format!("columns.{}", column.key);
        let translated = self.render(&key, &[]);
        if translated.is_empty() || translated.ends_with(&key) {
            column.label.to_string()
        } else {
            translated
        }
    }

    // ===== 行级 =====

    pub fn required(&self, row: usize, label: &str) -> String {
        self.render("import.row_required", &[("row", &row.to_string()), ("label", label)])
    }

    pub fn invalid(&self, row: usize, label: &str, value: &str) -> String {
        self.render(
            "import.row_invalid",
            &[("row", &row.to_string()), ("label", label), ("value", value)],
        )
    }

    pub fn invalid_optional(&self, row: usize, label: &str, value: &str) -> String {
        self.render(
            "import.row_invalid_optional",
            &[("row", &row.to_string()), ("label", label), ("value", value)],
        )
    }

    pub fn row_failed(&self, row: usize, message: &str) -> String {
        self.render("import.row_failed", &[("row", &row.to_string()), ("message", message)])
    }

    pub fn invalid_datetime(&self, row: usize) -> String {
        self.render("import.invalid_datetime", &[("row", &row.to_string())])
    }

    pub fn client_not_found(&self, row: usize, email: &str) -> String {
        self.render("import.client_not_found", &[("row", &row.to_string()), ("email", email)])
    }

    pub fn service_not_found(&self, row: usize, name: &str) -> String {
        self.render("import.service_not_found", &[("row", &row.to_string()), ("name", name)])
    }

    pub fn duplicate_client(&self, row: usize, email: &str) -> String {
        self.render("import.duplicate_client", &[("row", &row.to_string()), ("email", email)])
    }

    pub fn duplicate_service(&self, row: usize, name: &str) -> String {
        self.render("import.duplicate_service", &[("row", &row.to_string()), ("name", name)])
    }

    // ===== 进度 =====

    pub fn parsing(&self, file: &str) -> String {
        self.render("progress.parsing", &[("file", file)])
    }

    pub fn validating(&self, current: usize, total: usize) -> String {
        self.render(
            "progress.validating",
            &[("current", &current.to_string()), ("total", &total.to_string())],
        )
    }

    pub fn importing(&self, current: usize, total: usize) -> String {
        self.render(
            "progress.importing",
            &[("current", &current.to_string()), ("total", &total.to_string())],
        )
    }

    pub fn completed(&self, imported: usize, errors: usize) -> String {
        self.render(
            "progress.completed",
            &[("imported", &imported.to_string()), ("errors", &errors.to_string())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::schemas::client_columns;

    #[test]
    fn test_required_message_format() {
        let messages = RowMessages::default();
        assert_eq!(messages.required(2, "Nom du famille"), "Ligne 2: Nom du famille requis");
    }

    #[test]
    fn test_column_label_per_locale() {
        let last_name = &client_columns()[1];
        assert_eq!(RowMessages::default().column_label(last_name), "Nom du famille");
        assert_eq!(RowMessages::new("en").column_label(last_name), "Last name");
        // 未提供的语言回退到法语 label
        assert_eq!(RowMessages::new("de").column_label(last_name), "Nom du famille");
    }

    #[test]
    fn test_english_messages() {
        let messages = RowMessages::new("en");
        assert_eq!(
            messages.client_not_found(4, "x@test.com"),
            "Row 4: client not found (x@test.com)"
        );
    }
}
