// ==========================================
// 电商报表摄取引擎 - 转写兜底
// ==========================================
// 职责: 辞典完全未命中时，把含中文的表头转写为可读的拼音 slug；
//       拼音特性关闭时降级为逐字符占位符（显式降级，日志可见）；
//       仍不可用时落到确定性哈希码，保证终止
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;

/// CJK 统一表意文字判定
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// FNV-1a 32 位哈希。跨进程/跨版本稳定（确定性是硬要求）
pub(crate) fn fnv1a32(text: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in text.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// 确定性哈希兜底码: field_<hash % 10000>
pub fn hashed_fallback_code(header: &str) -> String {
    format!("field_{}", fnv1a32(header) % 10000)
}

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("静态正则"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("静态正则"));

/// 代码化清理: 非字母数字 → 下划线，折叠重复，修剪两端，小写
pub fn cleanup_code(raw: &str) -> String {
    let replaced = NON_WORD.replace_all(raw, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_lowercase()
}

/// 转写为 snake_case 风格 slug。
/// 产出仍可能为空或含 CJK（清理会保留 Unicode 词字符），由调用方落哈希兜底
pub fn transliterate_slug(header: &str) -> String {
    cleanup_code(&raw_slug(header))
}

#[cfg(feature = "pinyin")]
fn raw_slug(header: &str) -> String {
    use pinyin::ToPinyin;

    let mut parts: Vec<String> = Vec::new();
    for (ch, py) in header.chars().zip(header.to_pinyin()) {
        match py {
            Some(p) => parts.push(p.plain().to_string()),
            None => parts.push(ch.to_lowercase().to_string()),
        }
    }
    parts.join("_")
}

#[cfg(not(feature = "pinyin"))]
fn raw_slug(header: &str) -> String {
    use tracing::warn;

    // 显式降级: 无拼音支持时用稳定的逐字符数字占位符
    warn!(header = %header, "拼音特性未启用，使用占位符转写");
    let mut parts: Vec<String> = Vec::new();
    for ch in header.chars() {
        if ('\u{4e00}'..='\u{9fff}').contains(&ch) {
            parts.push(format!("c{:02}", (ch as u32) % 100));
        } else {
            parts.push(ch.to_lowercase().to_string());
        }
    }
    parts.join("_")
}
