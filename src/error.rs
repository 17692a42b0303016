// ==========================================
// 电商报表摄取引擎 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 摄取引擎错误类型
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 解析链错误 =====
    /// 所有解析策略均已耗尽。携带首个策略的底层诊断信息
    /// （首个策略的失败对误分类文件最具参考价值）
    #[error("文件无法读取（所有解析策略均失败，首个策略 {strategy}）: {message}")]
    UnreadableFile { strategy: String, message: String },

    /// OLE 容器却带 .xlsx 扩展名（含图片导出件）且降级读取失败。
    /// 该路径不再回退，直接给出用户可操作的提示
    #[error("无法读取 OLE 格式 XLSX 文件（可能含大量图片）。建议：用 Excel 打开后另存为标准 .xlsx 再上传。底层错误: {0}")]
    OleXlsxUnreadable(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("HTML 文件中没有找到表格")]
    HtmlNoTable,

    #[error("表格无数据行（表头行偏移 {header_row} 超出范围）")]
    EmptyTable { header_row: usize },

    // ===== 规范化错误 =====
    /// 关键列第一行为空，通常意味着表头行配置错误而非数据缺口，
    /// 硬失败，不返回部分填充的表格
    #[error("关键列 '{column}' 第一行为空，无法前向填充。可能是表头行设置错误或数据格式问题")]
    ForcedFillFirstRowBlank { column: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::FileReadError(err.to_string())
    }
}

/// Result 类型别名
pub type IngestResult<T> = Result<T, IngestError>;
