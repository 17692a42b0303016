// ==========================================
// 电商报表摄取引擎 - 字段映射模块
// ==========================================
// 职责: 把异构多语言表头解析为规范字段代码
// 解析链: 过滤 → 精确匹配 → 最长同义词部分匹配(递归组合) → 拼音转写 → 哈希兜底
// ==========================================

pub mod dictionary;
pub mod filter;
pub mod translit;

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::mapper::dictionary::{DomainView, FieldDictionary};
use crate::mapper::filter::should_filter_header;
use crate::mapper::translit::{
    cleanup_code, contains_cjk, hashed_fallback_code, transliterate_slug,
};

/// 表头解析方式，按置信度降序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// 标签/同义词逐字命中，或本就是可直接清洗的西文表头
    Exact,
    /// 最长同义词子串命中，余部递归组合
    Partial,
    /// 逐字拼音转写
    Transliterated,
    /// 哈希兜底，指代不明
    Unmapped,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Exact => "exact",
            ResolutionMethod::Partial => "partial",
            ResolutionMethod::Transliterated => "transliterated",
            ResolutionMethod::Unmapped => "unmapped",
        }
    }
}

/// 单个表头的解析结果
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedColumn {
    /// 原始表头在行内的位置（过滤不改变下标）
    pub source_index: usize,
    /// 原始表头（已去首尾空白）
    pub header: String,
    /// 规范字段代码，同批次内唯一
    pub field_code: String,
    pub method: ResolutionMethod,
}

/// 一次表头解析的汇总，随摄取结果返回给调用方
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionSummary {
    pub total_headers: usize,
    /// 被过滤的噪声表头（日期范围、Unnamed、工作表标记）
    pub filtered: Vec<String>,
    /// 走了哈希兜底的表头，提示辞典待补
    pub unmapped: Vec<String>,
    /// 各解析方式的命中次数
    pub method_counts: BTreeMap<String, usize>,
}

/// 表头解析器。持有某数据域的辞典视图，会话期内无状态复用
pub struct FieldMappingResolver {
    view: DomainView,
}

impl FieldMappingResolver {
    pub fn new(dictionary: &FieldDictionary, data_domain: Option<&str>) -> Self {
        Self {
            view: dictionary.domain_view(data_domain),
        }
    }

    /// 解析一行表头。返回保留列（过滤列不在其中）与汇总
    pub fn resolve(&self, headers: &[String]) -> (Vec<ResolvedColumn>, ResolutionSummary) {
        let mut columns = Vec::with_capacity(headers.len());
        let mut summary = ResolutionSummary {
            total_headers: headers.len(),
            ..Default::default()
        };
        let mut assigned: HashSet<String> = HashSet::new();

        for (index, raw) in headers.iter().enumerate() {
            let header = raw.trim();
            if should_filter_header(header) {
                debug!(header = header, index, "表头已过滤");
                summary.filtered.push(header.to_string());
                continue;
            }

            let (code, method) = self.resolve_one(header);
            if method == ResolutionMethod::Unmapped {
                warn!(header = header, code = %code, "表头无法解析，使用哈希兜底");
                summary.unmapped.push(header.to_string());
            }
            *summary
                .method_counts
                .entry(method.as_str().to_string())
                .or_insert(0) += 1;

            let field_code = ensure_unique(code, &mut assigned);
            columns.push(ResolvedColumn {
                source_index: index,
                header: header.to_string(),
                field_code,
                method,
            });
        }

        (columns, summary)
    }

    fn resolve_one(&self, header: &str) -> (String, ResolutionMethod) {
        if !contains_cjk(header) {
            // 西文表头不查辞典，直接清洗成代码
            let cleaned = cleanup_code(header);
            return if cleaned.is_empty() {
                (hashed_fallback_code(header), ResolutionMethod::Unmapped)
            } else {
                (cleaned, ResolutionMethod::Exact)
            };
        }
        self.translate(header)
    }

    fn translate(&self, header: &str) -> (String, ResolutionMethod) {
        if let Some(code) = self.view.lookup_exact(header) {
            return (code.to_string(), ResolutionMethod::Exact);
        }

        // 最长同义词优先，避免短词抢占更具体的命中
        for (synonym, code) in self.view.synonyms_by_len() {
            if !header.contains(synonym) {
                continue;
            }
            let remainder = header.replace(synonym, "");
            let remainder = remainder.trim();
            if remainder.is_empty() {
                return (code.to_string(), ResolutionMethod::Partial);
            }
            // 余部有独立含义则组合，否则只取主命中
            return match self.translate_fragment(remainder) {
                Some(rest) => (format!("{}_{}", code, rest), ResolutionMethod::Partial),
                None => (code.to_string(), ResolutionMethod::Partial),
            };
        }

        let slug = transliterate_slug(header);
        if slug.is_empty() || contains_cjk(&slug) {
            (hashed_fallback_code(header), ResolutionMethod::Unmapped)
        } else {
            (slug, ResolutionMethod::Transliterated)
        }
    }

    /// 递归解析余部片段。哈希兜底不算有意义的译名
    fn translate_fragment(&self, fragment: &str) -> Option<String> {
        let (code, method) = if contains_cjk(fragment) {
            self.translate(fragment)
        } else {
            let cleaned = cleanup_code(fragment);
            if cleaned.is_empty() {
                return None;
            }
            (cleaned, ResolutionMethod::Exact)
        };
        (method != ResolutionMethod::Unmapped).then_some(code)
    }
}

/// 批次内唯一化: 冲突时追加 _1, _2 ... 后缀
fn ensure_unique(code: String, assigned: &mut HashSet<String>) -> String {
    if assigned.insert(code.clone()) {
        return code;
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}", code, counter);
        if assigned.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
