// ==========================================
// 电商报表摄取引擎 - XLSX 读取策略
// ==========================================
// 支持: 标准 ZIP 容器 XLSX（calamine Xlsx 引擎）
// ==========================================

use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, RawGrid};
use crate::parser::grid_from_rows;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// 读取标准 XLSX 文件为原始表格
pub fn read_xlsx_grid(
    path: &Path,
    header_row: usize,
    row_limit: Option<usize>,
) -> IngestResult<RawGrid> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| IngestError::ExcelParseError(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(IngestError::ExcelParseError(
            "Excel 文件无工作表".to_string(),
        ));
    }

    // 读取第一个 sheet
    let sheet_name = sheet_names[0].clone();
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::ExcelParseError(e.to_string()))?;

    let all_rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    grid_from_rows(all_rows, header_row, row_limit)
}

/// calamine 单元格 → 松散类型单元格
pub(crate) fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        // 序列号形式保留数值，由下游按字段语义解释
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        // 公式错误单元格视为空白
        Data::Error(_) => CellValue::Blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Blank);
        assert_eq!(
            convert_cell(&Data::String("  订单号  ".to_string())),
            CellValue::Text("订单号".to_string())
        );
        assert_eq!(convert_cell(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            convert_cell(&Data::String("   ".to_string())),
            CellValue::Blank
        );
    }

    #[test]
    fn test_missing_file() {
        let result = read_xlsx_grid(Path::new("non_existent.xlsx"), 0, None);
        assert!(result.is_err());
    }
}
