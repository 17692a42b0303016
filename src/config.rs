// ==========================================
// 电商报表摄取引擎 - 引擎配置
// ==========================================
// 职责: 成本上界与回退开关，构造注入，无全局状态
// ==========================================

use serde::Deserialize;
use std::path::PathBuf;

/// 引擎配置。所有阈值均为成本上界（引擎防御无界成本，不防御无界时间）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTML 兜底解析的文件大小上限（MB）。超过则 OleBinary 链跳过 HTML 兜底
    pub html_fallback_max_mb: f64,

    /// 大文件阈值（MB）。超过则规范化只处理关键列
    pub large_file_threshold_mb: f64,

    /// 启发式前向填充的空白占比阈值
    pub blank_ratio_threshold: f64,

    /// 修复文件缓存目录。None 时使用系统临时目录
    pub repair_cache_dir: Option<PathBuf>,

    /// 默认读取行数上限。None 表示不限制
    pub default_row_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            html_fallback_max_mb: 5.0,
            large_file_threshold_mb: 10.0,
            blank_ratio_threshold: 0.2,
            repair_cache_dir: None,
            default_row_limit: None,
        }
    }
}

impl EngineConfig {
    /// 修复缓存目录（未配置时落到系统临时目录下的子目录）
    pub fn repair_cache_dir(&self) -> PathBuf {
        self.repair_cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ecom_ingest_repaired"))
    }
}
