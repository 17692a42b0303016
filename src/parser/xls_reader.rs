// ==========================================
// 电商报表摄取引擎 - 旧式 XLS 读取策略
// ==========================================
// 支持: OLE 二进制容器（calamine Xls 引擎，跳过格式与图片）
// 同时服务 OleBinary 与 OleWithZipExtension 两条路径
// ==========================================

use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, RawGrid};
use crate::parser::grid_from_rows;
use crate::parser::xlsx_reader::convert_cell;
use calamine::{open_workbook, Reader, Xls};
use std::path::Path;

/// 读取旧式二进制 XLS 文件为原始表格
pub fn read_xls_grid(
    path: &Path,
    header_row: usize,
    row_limit: Option<usize>,
) -> IngestResult<RawGrid> {
    let mut workbook: Xls<_> = open_workbook(path)
        .map_err(|e: calamine::XlsError| IngestError::ExcelParseError(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(IngestError::ExcelParseError(
            "Excel 文件无工作表".to_string(),
        ));
    }

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
