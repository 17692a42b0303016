// ==========================================
// 电商报表摄取引擎 - 文件格式嗅探
// ==========================================
// 职责: 依据文件头字节（而非扩展名）判定真实容器格式
// 支持: ZIP(真 xlsx) / OLE(旧 xls) / OLE 伪装 xlsx / HTML 伪装 / 未知
// ==========================================

/// ZIP 容器魔数（真正的 XLSX）
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE/CFB 容器魔数（Excel 97-2003）
pub const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// 扩展嗅探读取的最大字节数
const EXTENDED_SNIFF_LEN: usize = 2048;

/// HTML 嗅探标签（小写匹配）
const HTML_TAGS: [&[u8]; 4] = [b"<html", b"<!doctype", b"<table", b"<tbody"];

/// 文件真实容器格式。由字节前缀与声明扩展名一次性判定，之后不再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    /// ZIP 容器，标准 XLSX
    Zip,
    /// OLE 二进制容器，旧式 XLS
    OleBinary,
    /// OLE 容器但扩展名为 .xlsx（含嵌入图片的导出件，良性但需降级处理）
    OleWithZipExtension,
    /// HTML 表格伪装成电子表格扩展名
    HtmlDisguised,
    /// 无法识别
    Unknown,
}

impl DetectedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedFormat::Zip => "zip",
            DetectedFormat::OleBinary => "ole_binary",
            DetectedFormat::OleWithZipExtension => "ole_with_zip_extension",
            DetectedFormat::HtmlDisguised => "html_disguised",
            DetectedFormat::Unknown => "unknown",
        }
    }
}

/// 格式嗅探器。纯函数，无副作用
pub struct FormatSniffer;

impl FormatSniffer {
    /// 检测文件真实格式
    ///
    /// # 参数
    /// - bytes: 文件字节（至少应包含文件头，嗅探最多使用前 2048 字节）
    /// - extension: 调用方声明的扩展名（大小写不敏感，可带点）
    pub fn detect(bytes: &[u8], extension: &str) -> DetectedFormat {
        let ext = extension.trim_start_matches('.').to_lowercase();

        // 优先检测 ZIP（真正的 XLSX），与扩展名无关
        if bytes.starts_with(&ZIP_MAGIC) {
            return DetectedFormat::Zip;
        }

        // OLE：可能是真 xls，也可能是含图片的 xlsx（特殊导出件）
        if bytes.starts_with(&OLE_MAGIC) {
            if ext == "xlsx" {
                return DetectedFormat::OleWithZipExtension;
            }
            return DetectedFormat::OleBinary;
        }

        // 前缀直接像 HTML
        if Self::starts_with_html_tag(bytes) {
            return DetectedFormat::HtmlDisguised;
        }

        // 非 OLE 非 ZIP：在前 2048 字节内扫描 HTML 伪装
        // （.xls 扩展名的常见情形，但对任意扩展名兜底生效）
        if Self::sniff_html(bytes) {
            return DetectedFormat::HtmlDisguised;
        }

        DetectedFormat::Unknown
    }

    /// 前 8 字节是否以 HTML 标签开头（大小写不敏感）
    fn starts_with_html_tag(bytes: &[u8]) -> bool {
        let prefix: Vec<u8> = bytes.iter().take(16).map(u8::to_ascii_lowercase).collect();
        prefix.starts_with(b"<html") || prefix.starts_with(b"<!doctype")
    }

    /// 在前 2048 字节内扫描 HTML 标签（大小写不敏感）
    fn sniff_html(bytes: &[u8]) -> bool {
        let window: Vec<u8> = bytes
            .iter()
            .take(EXTENDED_SNIFF_LEN)
            .map(u8::to_ascii_lowercase)
            .collect();
        HTML_TAGS
            .iter()
            .any(|tag| window.windows(tag.len()).any(|w| &w == tag))
    }
}
