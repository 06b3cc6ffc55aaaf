// ==========================================
// Agenda 导入 - Excel 导入模板
// ==========================================
// 内容: 表头（列 label, 必填列高亮）+ 两行示例
// 约束: 模板表头经 detect_columns 必须覆盖全部必填列
// ==========================================

use crate::domain::import::RawGrid;
use crate::domain::types::EntityType;
use crate::importer::error::ImportOutcome;
use crate::importer::schemas::columns_for;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

const COLUMN_WIDTH: f64 = 22.0;
const REQUIRED_FILL: u32 = 0xFDE68A;

/// 第二行示例（按列定义顺序）
fn second_example(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::Client => &[
            "Jean",
            "Martin",
            "jean.martin@exemple.com",
            "438-555-0199",
            "45 avenue du Parc",
            "Québec",
            "G1R 2L3",
            "",
            "0",
        ],
        EntityType::Service => &[
            "Manucure",
            "Soin des mains complet",
            "45",
            "35.00",
            "#10B981",
            "Esthétique",
        ],
        EntityType::Appointment => &[
            "jean.martin@exemple.com",
            "Manucure",
            "2025-03-15",
            "10:00",
            "45",
            "planifié",
            "35.00",
            "",
        ],
    }
}

/// 模板内容（内存表格）
pub fn template_grid(entity: EntityType) -> RawGrid {
    let columns = columns_for(entity);
    let header = columns.iter().map(|c| c.label.to_string()).collect();
    let first = columns.iter().map(|c| c.example.to_string()).collect();
    let second = columns
        .iter()
        .enumerate()
        .map(|(i, _)| second_example(entity).get(i).copied().unwrap_or("").to_string())
        .collect();

    vec![header, first, second]
}

fn write_sheet(worksheet: &mut Worksheet, entity: EntityType) -> ImportOutcome<()> {
    let columns = columns_for(entity);
    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let required_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_background_color(Color::RGB(REQUIRED_FILL));

    worksheet.set_name(entity.template_name())?;

    let grid = template_grid(entity);
    for (col, column) in columns.iter().enumerate() {
        let col = col as u16;
        let format = if column.required {
            &required_format
        } else {
            &header_format
        };
        worksheet.write_string_with_format(0, col, column.label, format)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (row_index, row) in grid.iter().enumerate().skip(1) {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_index as u32, col as u16, value)?;
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn build_workbook(entity: EntityType) -> ImportOutcome<Workbook> {
    let mut workbook = Workbook::new();
    write_sheet(workbook.add_worksheet(), entity)?;
    Ok(workbook)
}

/// 生成 .xlsx 模板文件
pub fn generate_template<P: AsRef<Path>>(entity: EntityType, path: P) -> ImportOutcome<()> {
    let path = path.as_ref();
    let mut workbook = build_workbook(entity)?;
    workbook.save(path)?;
    info!(entity = %entity, path = %path.display(), "导入模板已生成");
    Ok(())
}

/// 生成 .xlsx 模板内容（下载用）
pub fn template_bytes(entity: EntityType) -> ImportOutcome<Vec<u8>> {
    let mut workbook = build_workbook(entity)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::column_mapper::detect_columns;
    use crate::importer::file_parser::UniversalFileParser;

    #[test]
    fn test_template_grid_shape() {
        for entity in EntityType::ALL {
            let grid = template_grid(entity);
            let width = columns_for(entity).len();
            assert_eq!(grid.len(), 3);
            assert!(grid.iter().all(|row| row.len() == width), "{}", entity);
            assert_eq!(second_example(entity).len(), width, "{}", entity);
        }
    }

    #[test]
    fn test_template_examples_are_valid() {
        for entity in EntityType::ALL {
            let grid = template_grid(entity);
            for (column, value) in columns_for(entity).iter().zip(&grid[2]) {
                assert!(value.is_empty() || column.validate(value), "{}.{}", entity, column.key);
            }
        }
    }

    #[test]
    fn test_template_bytes_round_trip() {
        for entity in EntityType::ALL {
            let bytes = template_bytes(entity).unwrap();
            let grid = UniversalFileParser.parse_bytes("modele.xlsx", &bytes).unwrap();

            assert_eq!(grid[0], template_grid(entity)[0]);
            let mapping = detect_columns(&grid, columns_for(entity));
            assert!(mapping.missing_required(columns_for(entity)).is_empty(), "{}", entity);
        }
    }
}
