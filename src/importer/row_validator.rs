// ==========================================
// Agenda 导入 - 行校验器
// ==========================================
// 职责: 单行按列定义校验 + 转换, 产出 RowRecord
// 规则:
// - 未映射的列视为空单元格
// - 必填且为空 → 错误
// - 非空但校验失败: 必填 → 错误, 非必填 → 警告并丢弃该字段
// - 整行空白: 默认按普通行校验（必填列报错）; skip_blank_rows 开启时跳过
// ==========================================

use crate::domain::import::{ImportColumn, ImportMapping, RowRecord};
use crate::importer::messages::RowMessages;

/// 校验模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// 导入路径: 第一个必填失败即放弃该行
    FailFast,
    /// 仅校验路径: 记录该行全部失败
    Exhaustive,
}

/// 单行校验结果
#[derive(Debug, Clone, PartialEq)]
pub enum RowCheck {
    Blank,
    Valid {
        record: RowRecord,
        warnings: Vec<String>,
    },
    Invalid {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

/// 数据起始行
pub fn first_data_row(skip_first_row: bool) -> usize {
    if skip_first_row {
        1
    } else {
        0
    }
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// 表头定位: 先精确匹配（去空白）, 再不区分大小写
fn resolve_header_index(headers: &[String], header: &str) -> Option<usize> {
    let wanted = header.trim();
    headers
        .iter()
        .position(|h| h.trim() == wanted)
        .or_else(|| {
            let lowered = wanted.to_lowercase();
            headers.iter().position(|h| h.trim().to_lowercase() == lowered)
        })
}

// ==========================================
// RowValidator
// ==========================================
pub struct RowValidator<'a> {
    columns: &'a [ImportColumn],
    indices: Vec<Option<usize>>, // 与 columns 一一对应
    labels: Vec<String>,         // 消息中的列名（按语言）
    messages: &'a RowMessages,
    skip_blank_rows: bool,
}

impl<'a> RowValidator<'a> {
    /// # 参数
    /// - columns: 列定义
    /// - headers: 表格第 0 行
    /// - mapping: 列 key → 表头
    pub fn new(
        columns: &'a [ImportColumn],
        headers: &[String],
        mapping: &ImportMapping,
        messages: &'a RowMessages,
    ) -> Self {
        let indices = columns
            .iter()
            .map(|column| {
                mapping
                    .get(column.key)
                    .and_then(|header| resolve_header_index(headers, header))
            })
            .collect();

        let labels = columns.iter().map(|column| messages.column_label(column)).collect();

        Self {
            columns,
            indices,
            labels,
            messages,
            skip_blank_rows: false,
        }
    }

    /// 整行空白时返回 RowCheck::Blank
    pub fn skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }

    /// 已定位到表头的列数
    pub fn resolved_columns(&self) -> usize {
        self.indices.iter().filter(|i| i.is_some()).count()
    }

    /// 校验一行
    ///
    /// # 参数
    /// - row: 单元格
    /// - row_number: 1 起始的表格行号（用于消息）
    pub fn validate_row(&self, row: &[String], row_number: usize, mode: ValidationMode) -> RowCheck {
        if self.skip_blank_rows && is_blank_row(row) {
            return RowCheck::Blank;
        }

        let mut record = RowRecord::new(row_number);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for ((column, index), label) in self.columns.iter().zip(&self.indices).zip(&self.labels) {
            let raw = index
                .and_then(|i| row.get(i))
                .map(|cell| cell.trim())
                .unwrap_or("");

            if raw.is_empty() {
                if column.required {
                    errors.push(self.messages.required(row_number, label));
                    if mode == ValidationMode::FailFast {
                        break;
                    }
                }
                continue;
            }

            if !column.validate(raw) {
                if column.required {
                    errors.push(self.messages.invalid(row_number, label, raw));
                    if mode == ValidationMode::FailFast {
                        break;
                    }
                } else {
                    warnings.push(self.messages.invalid_optional(row_number, label, raw));
                }
                continue;
            }

            record.fields.insert(column.key, column.apply(raw));
        }

        if errors.is_empty() {
            RowCheck::Valid { record, warnings }
        } else {
            RowCheck::Invalid { errors, warnings }
        }
    }
}

// ==========================================
// 仅校验路径
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub valid: Vec<RowRecord>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub skipped: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 校验全部数据行（不落库, 每行记录全部失败）
pub fn validate_rows(
    grid: &[Vec<String>],
    mapping: &ImportMapping,
    columns: &[ImportColumn],
    skip_first_row: bool,
    messages: &RowMessages,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(headers) = grid.first() else {
        return report;
    };

    let validator = RowValidator::new(columns, headers, mapping, messages);
    let start = first_data_row(skip_first_row);

    for (index, row) in grid.iter().enumerate().skip(start) {
        report.total_rows += 1;
        match validator.validate_row(row, index + 1, ValidationMode::Exhaustive) {
            RowCheck::Blank => report.skipped += 1,
            RowCheck::Valid { record, warnings } => {
                report.warnings.extend(warnings);
                report.valid.push(record);
            }
            RowCheck::Invalid { errors, warnings } => {
                report.errors.extend(errors);
                report.warnings.extend(warnings);
            }
        }
    }

    report
}
