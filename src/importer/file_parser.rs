// ==========================================
// Agenda 导入 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: RawGrid（第 0 行为表头, 保留空白行以保证行号与文件一致）
// 红线: 文件缺失/为空/损坏/格式不支持 → 整体失败
// ==========================================

use crate::domain::import::RawGrid;
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, open_workbook_from_rs, Data, DataType, Range, Reader, Xls, Xlsx};
use chrono::{Datelike, NaiveTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &str = "\u{feff}";

/// 文件扩展名（小写）
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportOutcome<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 去掉末尾空白行; 全部空白视为空文件
fn finalize_grid(mut grid: RawGrid, source: &str) -> ImportOutcome<RawGrid> {
    while grid
        .last()
        .is_some_and(|row| row.iter().all(|cell| cell.trim().is_empty()))
    {
        grid.pop();
    }

    if grid.is_empty() {
        return Err(ImportError::EmptyFile(source.to_string()));
    }

    if let Some(first) = grid.first_mut().and_then(|row| row.first_mut()) {
        if let Some(stripped) = first.strip_prefix(UTF8_BOM) {
            *first = stripped.to_string();
        }
    }

    debug!(rows = grid.len(), source, "表格解析完成");
    Ok(grid)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 分隔符探测: 法语版 Excel 导出的 CSV 通常使用 ';'
    fn detect_delimiter(bytes: &[u8]) -> u8 {
        let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
        let semicolons = first_line.iter().filter(|b| **b == b';').count();
        let commas = first_line.iter().filter(|b| **b == b',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }

    pub fn parse_bytes(&self, bytes: &[u8], source: &str) -> ImportOutcome<RawGrid> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(Self::detect_delimiter(bytes))
            .from_reader(bytes);

        let mut grid = Vec::new();
        for result in reader.byte_records() {
            let record = result?;
            // 非 UTF-8 内容按有损转换, 不中断整个导入
            let row: Vec<String> = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).trim().to_string())
                .collect();
            grid.push(row);
        }

        finalize_grid(grid, source)
    }
}

impl FileParser for CsvParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportOutcome<RawGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut bytes = Vec::new();
        File::open(file_path)?.read_to_end(&mut bytes)?;
        self.parse_bytes(&bytes, &file_path.display().to_string())
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    pub fn parse_bytes(&self, bytes: &[u8], ext: &str, source: &str) -> ImportOutcome<RawGrid> {
        let cursor = Cursor::new(bytes.to_vec());
        let range = match ext {
            "xlsx" => {
                let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
                    .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;
                let sheet = first_sheet_name(workbook.sheet_names(), source)?;
                workbook
                    .worksheet_range(&sheet)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?
            }
            "xls" => {
                let mut workbook: Xls<_> = open_workbook_from_rs(cursor)
                    .map_err(|e: calamine::XlsError| ImportError::ExcelParseError(e.to_string()))?;
                let sheet = first_sheet_name(workbook.sheet_names(), source)?;
                workbook
                    .worksheet_range(&sheet)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?
            }
            other => return Err(ImportError::UnsupportedFormat(other.to_string())),
        };

        range_to_grid(&range, source)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportOutcome<RawGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let source = file_path.display().to_string();
        let mut workbook = open_workbook_auto(file_path)?;
        let sheet = first_sheet_name(workbook.sheet_names(), &source)?;
        let range = workbook.worksheet_range(&sheet)?;

        range_to_grid(&range, &source)
    }
}

/// 只读取第一个工作表
fn first_sheet_name(sheet_names: Vec<String>, source: &str) -> ImportOutcome<String> {
    sheet_names.into_iter().next().ok_or_else(|| {
        ImportError::ExcelParseError(format!("aucune feuille de calcul dans {}", source))
    })
}

fn range_to_grid(range: &Range<Data>, source: &str) -> ImportOutcome<RawGrid> {
    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    finalize_grid(grid, source)
}

/// 单元格 → 文本
///
/// - 整数浮点数去掉 ".0"（电话号码、积分常被存成数字）
/// - 日期单元格 → YYYY-MM-DD; 纯时间 → HH:MM; 日期时间 → YYYY-MM-DD HH:MM
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) => match cell.as_datetime() {
            // Excel 纯时间的序列号 < 1, 落在 1899-12-31
            Some(dt) if dt.date().year() < 1900 => dt.format("%H:%M").to_string(),
            Some(dt) if dt.time() == NaiveTime::default() => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string().trim().to_string(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportOutcome<RawGrid> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_grid(path),
            "xlsx" | "xls" => ExcelParser.parse_to_grid(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// 解析上传内容（文件名只用于判断格式）
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportOutcome<RawGrid> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile(file_name.to_string()));
        }

        let ext = extension_of(Path::new(file_name));
        match ext.as_str() {
            "csv" => CsvParser.parse_bytes(bytes, file_name),
            "xlsx" | "xls" => ExcelParser.parse_bytes(bytes, &ext, file_name),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportOutcome<RawGrid> {
        self.parse(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_with(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_parser_keeps_header_row() {
        let file = temp_with(".csv", "Nom,Prénom,Courriel\nTremblay,Marie,marie@test.com\n");

        let grid = CsvParser.parse_to_grid(file.path()).unwrap();

        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], vec!["Nom", "Prénom", "Courriel"]);
        assert_eq!(grid[1][2], "marie@test.com");
    }

    #[test]
    fn test_csv_parser_semicolon_and_bom() {
        let file = temp_with(".csv", "\u{feff}Nom;Prénom\nTremblay;Marie\n");

        let grid = CsvParser.parse_to_grid(file.path()).unwrap();

        assert_eq!(grid[0], vec!["Nom", "Prénom"]);
        assert_eq!(grid[1], vec!["Tremblay", "Marie"]);
    }

    #[test]
    fn test_csv_parser_keeps_inner_blank_rows() {
        let file = temp_with(".csv", "Nom,Prénom\nA,B\n,\nC,D\n,\n");

        let grid = CsvParser.parse_to_grid(file.path()).unwrap();

        // 中间空白行保留（行号不变）, 末尾空白行去掉
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[3], vec!["C", "D"]);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_grid(Path::new("introuvable.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let file = temp_with(".csv", "");
        let result = UniversalFileParser.parse(file.path());
        assert!(matches!(result, Err(ImportError::EmptyFile(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_with(".txt", "Nom\nA\n");
        let result = UniversalFileParser.parse(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_corrupt_excel_is_fatal() {
        let result = UniversalFileParser.parse_bytes("clients.xlsx", b"pas un classeur");
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_cell_to_string_numbers() {
        assert_eq!(cell_to_string(&Data::Float(5145550123.0)), "5145550123");
        assert_eq!(cell_to_string(&Data::Float(45.5)), "45.5");
        assert_eq!(cell_to_string(&Data::Int(3)), "3");
        assert_eq!(cell_to_string(&Data::String("  Marie ".to_string())), "Marie");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
