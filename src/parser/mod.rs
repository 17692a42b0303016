// ==========================================
// 电商报表摄取引擎 - 多策略解析器
// ==========================================
// 职责: 按格式组织有序策略链，失败即降级，首个成功短路
// 链序: 见各格式分支；同一文件同一会话内不重试已失败策略
// 修复重入: 递归深度上限 1（修复件绝不二次修复）
// ==========================================

pub mod html_reader;
pub mod repair;
pub mod xls_reader;
pub mod xlsx_reader;

pub use repair::AutoRepairService;

use crate::config::EngineConfig;
use crate::error::{IngestError, IngestResult};
use crate::format::{DetectedFormat, FormatSniffer};
use crate::grid::{CellValue, RawGrid};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// 日志与记录中的错误文本截断长度
const ERR_TRUNCATE_LEN: usize = 120;

/// 解析策略标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// 标准 XLSX 读取（ZIP 容器）
    Xlsx,
    /// 旧式二进制 XLS 读取（OLE 容器）
    Xls,
    /// 修复后重入解析
    RepairedRetry,
    /// HTML 表格兜底
    Html,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Xlsx => "xlsx",
            StrategyKind::Xls => "xls",
            StrategyKind::RepairedRetry => "repaired_retry",
            StrategyKind::Html => "html",
        }
    }
}

/// 策略链中的一次尝试。成功后不再重试
#[derive(Debug, Clone, Serialize)]
pub struct ParseAttempt {
    pub strategy: StrategyKind,
    pub succeeded: bool,
    /// 失败原因（截断），成功时为 None
    pub error: Option<String>,
    /// 成功时的数据行数
    pub rows: Option<usize>,
}

impl ParseAttempt {
    fn success(strategy: StrategyKind, rows: usize) -> Self {
        Self {
            strategy,
            succeeded: true,
            error: None,
            rows: Some(rows),
        }
    }

    fn failure(strategy: StrategyKind, error: &IngestError) -> Self {
        Self {
            strategy,
            succeeded: false,
            error: Some(truncate_err(&error.to_string())),
            rows: None,
        }
    }
}

/// 一次解析会话的产出
#[derive(Debug)]
pub struct ParseOutcome {
    pub grid: RawGrid,
    pub format: DetectedFormat,
    pub attempts: Vec<ParseAttempt>,
    pub file_size_mb: f64,
}

/// 多策略解析服务。构造注入，无全局状态
pub struct ParserService {
    config: EngineConfig,
    repair: AutoRepairService,
}

impl ParserService {
    pub fn new(config: EngineConfig) -> Self {
        let repair = AutoRepairService::new(config.repair_cache_dir());
        Self { config, repair }
    }

    /// 解析一个文件为原始表格
    ///
    /// # 参数
    /// - path: 文件路径（扩展名即调用方声明的扩展名）
    /// - header_row: 表头行偏移（0 起），不做自动探测
    /// - row_limit: 数据行数上限（表头升格之后截断）
    pub fn parse(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
    ) -> IngestResult<ParseOutcome> {
        self.parse_with_depth(path, header_row, row_limit, 0)
    }

    fn parse_with_depth(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
        depth: usize,
    ) -> IngestResult<ParseOutcome> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.display().to_string()));
        }

        let file_size = std::fs::metadata(path)?.len();
        let file_size_mb = file_size as f64 / (1024.0 * 1024.0);
        let head = read_head(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let format = FormatSniffer::detect(&head, &extension);
        info!(
            file = %path.display(),
            format = format.as_str(),
            size_mb = format!("{:.2}", file_size_mb),
            "文件格式检测完成"
        );

        let mut attempts = Vec::new();
        let grid = match format {
            DetectedFormat::Zip => self.parse_zip(path, header_row, row_limit, &mut attempts)?,
            DetectedFormat::OleWithZipExtension => {
                self.parse_ole_xlsx(path, header_row, row_limit, file_size_mb, &mut attempts)?
            }
            DetectedFormat::OleBinary => self.parse_ole_binary(
                path,
                header_row,
                row_limit,
                file_size_mb,
                depth,
                &mut attempts,
            )?,
            DetectedFormat::HtmlDisguised => {
                self.parse_html(path, header_row, row_limit, &mut attempts)?
            }
            DetectedFormat::Unknown => {
                return Err(IngestError::UnreadableFile {
                    strategy: "format_sniff".to_string(),
                    message: "无法识别的文件格式（非 ZIP/OLE/HTML）".to_string(),
                });
            }
        };

        info!(
            rows = grid.row_count(),
            cols = grid.column_count(),
            attempts = attempts.len(),
            "文件解析成功"
        );

        Ok(ParseOutcome {
            grid,
            format,
            attempts,
            file_size_mb,
        })
    }

    /// ZIP → 标准 XLSX 读取，失败即终止（罕见，视为致命）
    fn parse_zip(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
        attempts: &mut Vec<ParseAttempt>,
    ) -> IngestResult<RawGrid> {
        match xlsx_reader::read_xlsx_grid(path, header_row, row_limit) {
            Ok(grid) => {
                attempts.push(ParseAttempt::success(StrategyKind::Xlsx, grid.row_count()));
                Ok(grid)
            }
            Err(e) => {
                warn!(strategy = "xlsx", error = %truncate_err(&e.to_string()), "策略失败");
                attempts.push(ParseAttempt::failure(StrategyKind::Xlsx, &e));
                Err(IngestError::UnreadableFile {
                    strategy: StrategyKind::Xlsx.as_str().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// OLE 容器但 .xlsx 扩展名（含图片导出件）→ 降级 XLS 读取，
    /// 失败则给出用户可操作的终止错误，不再回退
    fn parse_ole_xlsx(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
        file_size_mb: f64,
        attempts: &mut Vec<ParseAttempt>,
    ) -> IngestResult<RawGrid> {
        warn!(
            size_mb = format!("{:.2}", file_size_mb),
            "检测到 OLE 格式但扩展名为 .xlsx（可能含大量图片），降级为 XLS 读取"
        );
        match xls_reader::read_xls_grid(path, header_row, row_limit) {
            Ok(grid) => {
                attempts.push(ParseAttempt::success(StrategyKind::Xls, grid.row_count()));
                Ok(grid)
            }
            Err(e) => {
                warn!(strategy = "xls", error = %truncate_err(&e.to_string()), "策略失败");
                attempts.push(ParseAttempt::failure(StrategyKind::Xls, &e));
                Err(IngestError::OleXlsxUnreadable(e.to_string()))
            }
        }
    }

    /// OLE 二进制 → 有序回退链:
    /// (1) XLS 读取 (2) XLSX 强制读取（处理伪装错标文件）
    /// (3) 自动修复后重入（深度上限 1）(4) 小文件 HTML 兜底
    /// (5) 全部失败返回 UnreadableFile（保留首个策略的诊断）
    fn parse_ole_binary(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
        file_size_mb: f64,
        depth: usize,
        attempts: &mut Vec<ParseAttempt>,
    ) -> IngestResult<RawGrid> {
        // 策略 1: 旧式二进制读取
        let first_error = match xls_reader::read_xls_grid(path, header_row, row_limit) {
            Ok(grid) => {
                attempts.push(ParseAttempt::success(StrategyKind::Xls, grid.row_count()));
                return Ok(grid);
            }
            Err(e) => {
                warn!(strategy = "xls", error = %truncate_err(&e.to_string()), "策略失败");
                attempts.push(ParseAttempt::failure(StrategyKind::Xls, &e));
                e
            }
        };

        // 策略 2: 强制按 XLSX 读取（文件可能只是被错误标注）
        match xlsx_reader::read_xlsx_grid(path, header_row, row_limit) {
            Ok(grid) => {
                attempts.push(ParseAttempt::success(StrategyKind::Xlsx, grid.row_count()));
                return Ok(grid);
            }
            Err(e) => {
                debug!(strategy = "xlsx", error = %truncate_err(&e.to_string()), "策略失败");
                attempts.push(ParseAttempt::failure(StrategyKind::Xlsx, &e));
            }
        }

        // 策略 3: 自动修复后重入（修复件不再二次修复）
        if depth == 0 {
            if let Some(repaired) = self.repair.repair(path) {
                match self.parse_with_depth(&repaired, header_row, row_limit, depth + 1) {
                    Ok(outcome) => {
                        attempts.push(ParseAttempt::success(
                            StrategyKind::RepairedRetry,
                            outcome.grid.row_count(),
                        ));
                        return Ok(outcome.grid);
                    }
                    Err(e) => {
                        warn!(strategy = "repaired_retry", error = %truncate_err(&e.to_string()), "策略失败");
                        attempts.push(ParseAttempt::failure(StrategyKind::RepairedRetry, &e));
                    }
                }
            } else {
                debug!("自动修复不可用，继续尝试 HTML 兜底");
            }
        }

        // 策略 4: HTML 兜底（仅小文件，成本上界）
        if file_size_mb <= self.config.html_fallback_max_mb {
            match html_reader::read_html_grid(path, header_row, row_limit) {
                Ok(grid) => {
                    attempts.push(ParseAttempt::success(StrategyKind::Html, grid.row_count()));
                    return Ok(grid);
                }
                Err(e) => {
                    debug!(strategy = "html", error = %truncate_err(&e.to_string()), "策略失败");
                    attempts.push(ParseAttempt::failure(StrategyKind::Html, &e));
                }
            }
        } else {
            warn!(
                size_mb = format!("{:.2}", file_size_mb),
                max_mb = self.config.html_fallback_max_mb,
                "大文件跳过 HTML 兜底"
            );
        }

        // 策略 5: 全部失败。携带首个策略的诊断（对误分类文件最有参考价值）
        Err(IngestError::UnreadableFile {
            strategy: StrategyKind::Xls.as_str().to_string(),
            message: first_error.to_string(),
        })
    }

    /// HTML 伪装 → 直接走 HTML 表格提取
    fn parse_html(
        &self,
        path: &Path,
        header_row: usize,
        row_limit: Option<usize>,
        attempts: &mut Vec<ParseAttempt>,
    ) -> IngestResult<RawGrid> {
        match html_reader::read_html_grid(path, header_row, row_limit) {
            Ok(grid) => {
                attempts.push(ParseAttempt::success(StrategyKind::Html, grid.row_count()));
                Ok(grid)
            }
            Err(e) => {
                warn!(strategy = "html", error = %truncate_err(&e.to_string()), "策略失败");
                attempts.push(ParseAttempt::failure(StrategyKind::Html, &e));
                Err(IngestError::UnreadableFile {
                    strategy: StrategyKind::Html.as_str().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/// 从全量行构造表格：跳过 header_row 行，下一行升格为表头，
/// 其余为数据行，row_limit 在此之后截断
pub(crate) fn grid_from_rows(
    all_rows: Vec<Vec<CellValue>>,
    header_row: usize,
    row_limit: Option<usize>,
) -> IngestResult<RawGrid> {
    let mut iter = all_rows.into_iter().skip(header_row);
    let header_cells = iter.next().ok_or(IngestError::EmptyTable { header_row })?;

    let headers: Vec<String> = header_cells
        .iter()
        .map(|c| c.as_text().trim().to_string())
        .collect();

    let mut rows: Vec<Vec<CellValue>> = iter.collect();
    if let Some(limit) = row_limit {
        rows.truncate(limit);
    }

    Ok(RawGrid::new(headers, rows))
}

/// 读取文件头部字节（嗅探用）
fn read_head(path: &Path) -> IngestResult<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; 2048];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

/// 截断错误文本，避免日志爆炸
fn truncate_err(message: &str) -> String {
    if message.chars().count() <= ERR_TRUNCATE_LEN {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(ERR_TRUNCATE_LEN).collect();
        format!("{}...", truncated)
    }
}
