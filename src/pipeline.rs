// ==========================================
// 电商报表摄取引擎 - 摄取流水线
// ==========================================
// 阶段次序固定: 嗅探/解析 → 规范化 → 字段映射 → 记录投影
// 每个阶段按值接管上游产出；任一阶段硬失败则整体失败，不产出半成品
// ==========================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::IngestResult;
use crate::format::DetectedFormat;
use crate::grid::{CellValue, RawGrid};
use crate::mapper::dictionary::FieldDictionary;
use crate::mapper::{FieldMappingResolver, ResolutionSummary, ResolvedColumn};
use crate::normalizer::{NormalizationReport, TableNormalizer};
use crate::parser::{ParseAttempt, ParserService};

/// 单次摄取的调用方参数
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// 数据域提示（orders/products/...），偏置关键列与辞典视图
    pub data_domain: Option<String>,
    /// 表头行偏移（0 起），不做自动探测
    pub header_row: usize,
    /// 数据行数上限。None 时回落到引擎配置的默认值
    pub row_limit: Option<usize>,
}

/// 规范化后的单条记录: 规范字段代码 → 单元格值
pub type NormalizedRecord = BTreeMap<String, CellValue>;

/// 一次摄取的完整产出，可直接序列化返回给调用方
#[derive(Debug, Serialize)]
pub struct IngestOutput {
    /// 摄取会话标识（日志关联用）
    pub session_id: String,
    pub source_file: String,
    pub format: DetectedFormat,
    pub file_size_mb: f64,
    /// 解析策略链的逐次尝试记录
    pub attempts: Vec<ParseAttempt>,
    /// 保留列及其解析方式
    pub columns: Vec<ResolvedColumn>,
    pub resolution: ResolutionSummary,
    pub normalization: NormalizationReport,
    /// 规范化后的数据记录
    pub records: Vec<NormalizedRecord>,
}

/// 摄取流水线。构造注入配置与辞典快照，会话期内无状态复用
pub struct IngestPipeline {
    config: EngineConfig,
    parser: ParserService,
    dictionary: FieldDictionary,
}

impl IngestPipeline {
    /// 使用内置业务词表构建
    pub fn new(config: EngineConfig) -> Self {
        Self::with_dictionary(config, FieldDictionary::builtin())
    }

    /// 注入外部辞典快照
    pub fn with_dictionary(config: EngineConfig, dictionary: FieldDictionary) -> Self {
        let parser = ParserService::new(config.clone());
        Self {
            config,
            parser,
            dictionary,
        }
    }

    /// 摄取单个报表文件
    #[instrument(skip(self, options), fields(file = %path.display()))]
    pub fn ingest(&self, path: &Path, options: &IngestOptions) -> IngestResult<IngestOutput> {
        let session_id = Uuid::new_v4().to_string();
        let row_limit = options.row_limit.or(self.config.default_row_limit);
        let domain = options.data_domain.as_deref();

        info!(
            session = %session_id,
            domain = domain.unwrap_or("-"),
            header_row = options.header_row,
            "开始摄取"
        );

        // 阶段 1: 嗅探 + 多策略解析
        let outcome = self.parser.parse(path, options.header_row, row_limit)?;

        // 阶段 2: 合并单元格治愈
        let normalizer = TableNormalizer::new(&self.config);
        let (grid, normalization) =
            normalizer.normalize(outcome.grid, domain, outcome.file_size_mb)?;

        // 阶段 3: 表头 → 规范字段代码
        let resolver = FieldMappingResolver::new(&self.dictionary, domain);
        let (columns, resolution) = resolver.resolve(&grid.headers);

        // 阶段 4: 按保留列投影为记录
        let records = project_records(&grid, &columns);

        info!(
            session = %session_id,
            records = records.len(),
            columns = columns.len(),
            filled_cells = normalization.filled_cells,
            unmapped = resolution.unmapped.len(),
            "摄取完成"
        );

        Ok(IngestOutput {
            session_id,
            source_file: path.display().to_string(),
            format: outcome.format,
            file_size_mb: outcome.file_size_mb,
            attempts: outcome.attempts,
            columns,
            resolution,
            normalization,
            records,
        })
    }
}

/// 把表格按保留列投影为记录序列。过滤列的数据不进入记录
fn project_records(grid: &RawGrid, columns: &[ResolvedColumn]) -> Vec<NormalizedRecord> {
    grid.rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|col| {
                    row.get(col.source_index)
                        .map(|cell| (col.field_code.clone(), cell.clone()))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ResolutionMethod;

    fn column(index: usize, header: &str, code: &str) -> ResolvedColumn {
        ResolvedColumn {
            source_index: index,
            header: header.to_string(),
            field_code: code.to_string(),
            method: ResolutionMethod::Exact,
        }
    }

    #[test]
    fn test_project_records_skips_filtered_columns() {
        let grid = RawGrid::new(
            vec![
                "订单号".to_string(),
                "Unnamed: 1".to_string(),
                "金额".to_string(),
            ],
            vec![
                vec![
                    CellValue::from("1001"),
                    CellValue::from("噪声"),
                    CellValue::Number(10.0),
                ],
                vec![
                    CellValue::from("1002"),
                    CellValue::Blank,
                    CellValue::Number(20.0),
                ],
            ],
        );
        // 第 1 列被过滤，投影时不出现
        let columns = vec![column(0, "订单号", "order_id"), column(2, "金额", "amount")];

        let records = project_records(&grid, &columns);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["order_id"], CellValue::Text("1001".into()));
        assert_eq!(records[0]["amount"], CellValue::Number(10.0));
        assert!(!records[0].contains_key("field_1"));
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_project_records_empty_grid() {
        let grid = RawGrid::new(vec!["订单号".to_string()], vec![]);
        let records = project_records(&grid, &[column(0, "订单号", "order_id")]);
        assert!(records.is_empty());
    }
}
