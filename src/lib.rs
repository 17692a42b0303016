// ==========================================
// 电商报表摄取与规范化引擎 - 核心库
// ==========================================
// 定位: 平台报表导出件的摄取前端（嗅探/解析/治愈/映射）
// 技术栈: calamine + scraper + cfb/zip + tracing
// 约定: 引擎无全局状态，所有依赖构造注入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 引擎配置 - 成本上界与回退开关
pub mod config;

// 错误类型
pub mod error;

// 文件格式嗅探
pub mod format;

// 原始表格数据结构
pub mod grid;

// 日志系统
pub mod logging;

// 字段映射 - 表头解析为规范字段代码
pub mod mapper;

// 表格规范化 - 合并单元格治愈
pub mod normalizer;

// 多策略解析器
pub mod parser;

// 摄取流水线 - 阶段编排
pub mod pipeline;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::EngineConfig;
pub use error::{IngestError, IngestResult};
pub use format::{DetectedFormat, FormatSniffer};
pub use grid::{CellValue, RawGrid};

pub use mapper::{
    dictionary::{FieldDictionary, FieldMappingEntry},
    FieldMappingResolver, ResolutionMethod, ResolutionSummary, ResolvedColumn,
};
pub use normalizer::{FillStrategy, NormalizationReport, TableNormalizer};
pub use parser::{ParseAttempt, ParseOutcome, ParserService, StrategyKind};
pub use pipeline::{IngestOptions, IngestOutput, IngestPipeline, NormalizedRecord};

// ==========================================
// 常量定义
// ==========================================

// 引擎版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 引擎名称
pub const APP_NAME: &str = "电商报表摄取引擎";
