// ==========================================
// 电商报表摄取引擎 - HTML 表格读取策略
// ==========================================
// 支持: HTML 伪装成电子表格的导出件（某些 ERP 的常见做法）
// 编码: 按固定顺序尝试 UTF-8 → GBK → Latin-1
// ==========================================

use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, RawGrid};
use crate::parser::grid_from_rows;
use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::Path;
use tracing::{debug, info};

/// 编码尝试顺序（固定，不可配置）
const ENCODINGS: [&Encoding; 3] = [UTF_8, GBK, WINDOWS_1252];

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("静态选择器"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("静态选择器"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("静态选择器"));

/// 读取 HTML 表格文件为原始表格
///
/// 每种编码均重新读取文件（与流水线的阻塞点模型一致）；
/// 解码无错的首个编码胜出，全部有错时以 Latin-1 宽松解码兜底
pub fn read_html_grid(
    path: &Path,
    header_row: usize,
    row_limit: Option<usize>,
) -> IngestResult<RawGrid> {
    let mut last_err = IngestError::HtmlNoTable;

    for (idx, encoding) in ENCODINGS.iter().enumerate() {
        let bytes = std::fs::read(path)?;
        let (text, _, had_errors) = encoding.decode(&bytes);

        let is_last = idx + 1 == ENCODINGS.len();
        if had_errors && !is_last {
            debug!(encoding = encoding.name(), "解码存在错误，尝试下一编码");
            continue;
        }

        match extract_first_table(&text, header_row, row_limit) {
            Ok(grid) => {
                info!(
                    encoding = encoding.name(),
                    rows = grid.row_count(),
                    cols = grid.column_count(),
                    "HTML 表格解析成功"
                );
                return Ok(grid);
            }
            Err(e) => {
                debug!(encoding = encoding.name(), error = %e, "HTML 解析失败");
                last_err = e;
            }
        }
    }

    Err(last_err)
}

/// 提取文档中的第一张表格
fn extract_first_table(
    html: &str,
    header_row: usize,
    row_limit: Option<usize>,
) -> IngestResult<RawGrid> {
    let document = Html::parse_document(html);

    let table = document
        .select(&TABLE_SELECTOR)
        .next()
        .ok_or(IngestError::HtmlNoTable)?;

    let all_rows: Vec<Vec<CellValue>> = table
        .select(&ROW_SELECTOR)
        .map(|tr| {
            tr.select(&CELL_SELECTOR)
                .map(|cell| {
                    let text = cell.text().collect::<String>();
                    CellValue::from(text.as_str())
                })
                .collect()
        })
        .collect();

    grid_from_rows(all_rows, header_row, row_limit)
}
