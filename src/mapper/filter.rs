// ==========================================
// 电商报表摄取引擎 - 表头过滤
// ==========================================
// 职责: 在进入辞典解析之前剔除不应入库的表头
// 规则: 空表头 / 表格元数据(Unnamed、工作表标记) / 日期范围格式
// 日期范围列会污染时间序列索引，必须整列丢弃
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;

/// 日期范围格式（锚定开头，如 2025_09_25_2025_09_25 或 2025-09-25~2025-09-25）
static DATE_RANGE_ANCHORED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}[-_]\d{1,2}[-_]\d{1,2}[-_~]\d{4}[-_]\d{1,2}[-_]\d{1,2}").expect("静态正则")
});

/// 日期范围格式（任意位置）
static DATE_RANGE_ANYWHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}[-_]\d{1,2}[-_]\d{1,2}[-_~]\d{4}[-_]\d{1,2}[-_]\d{1,2}").expect("静态正则")
});

/// 单个日期（用于双日期计数）
static SINGLE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[-_]\d{1,2}[-_]\d{1,2}").expect("静态正则"));

/// 工作表/页签类元数据标记
const SHEET_MARKERS: [&str; 4] = ["Sheet", "sheet", "工作表", "Tab"];

/// 表头是否为日期范围格式
pub fn is_date_range_header(header: &str) -> bool {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return false;
    }

    if DATE_RANGE_ANCHORED.is_match(trimmed) || DATE_RANGE_ANYWHERE.is_match(trimmed) {
        return true;
    }

    // 日期范围关键词
    let lower = trimmed.to_lowercase();
    if lower.contains("fan_wei") || trimmed.contains("日期范围") {
        return true;
    }

    // 包含两个及以上日期即视为范围
    SINGLE_DATE.find_iter(trimmed).count() >= 2
}

/// 表头是否应整列丢弃（不进入规范字段解析）
pub fn should_filter_header(header: &str) -> bool {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return true;
    }

    if is_date_range_header(trimmed) {
        return true;
    }

    // pandas 风格的占位列名
    if trimmed.starts_with("Unnamed") || trimmed.starts_with("unnamed") {
        return true;
    }

    // 工作表元数据标记
    SHEET_MARKERS.iter().any(|marker| trimmed.contains(marker))
}
