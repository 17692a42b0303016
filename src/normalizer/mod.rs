// ==========================================
// 电商报表摄取引擎 - 表格规范化器
// ==========================================
// 职责: 治愈合并单元格导致的块状空洞
// 规则: 度量列永不填充 / 关键列强制填充 / 其余列按空白占比启发填充
// 约束: 不改变任何列的类型；大文件只处理关键列
// ==========================================

pub mod keywords;

use crate::config::EngineConfig;
use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, RawGrid};
use chrono::{DateTime, Utc};
use keywords::keywords_for;
use serde::Serialize;
use tracing::{debug, info};

/// 本次规范化采用的填充策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// 全列评估的增强前向填充
    EnhancedFfill,
    /// 大文件模式：只评估/填充关键列
    LargeFileKeyColumnsOnly,
}

impl FillStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillStrategy::EnhancedFfill => "enhanced_ffill",
            FillStrategy::LargeFileKeyColumnsOnly => "large_file_key_columns_only",
        }
    }
}

/// 单列填充明细
#[derive(Debug, Clone, Serialize)]
pub struct ColumnFillReport {
    /// 列表头
    pub column: String,
    /// 新填充的单元格数
    pub filled_cells: usize,
    /// 是否按关键列强制填充
    pub key_column: bool,
}

/// 规范化报告。每个文件产出一份，规范化完成后只读
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationReport {
    /// 发生过填充的列
    pub filled_columns: Vec<String>,
    /// 新填充的单元格总数
    pub filled_cells: usize,
    /// 按关键列强制填充的列
    pub key_columns: Vec<String>,
    /// 采用的策略
    pub strategy: FillStrategy,
    /// 单列明细
    pub columns: Vec<ColumnFillReport>,
    /// 报告生成时间
    pub generated_at: DateTime<Utc>,
}

impl NormalizationReport {
    fn empty(strategy: FillStrategy) -> Self {
        Self {
            filled_columns: Vec::new(),
            filled_cells: 0,
            key_columns: Vec::new(),
            strategy,
            columns: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}

/// 表格规范化器
pub struct TableNormalizer {
    blank_ratio_threshold: f64,
    large_file_threshold_mb: f64,
}

impl TableNormalizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            blank_ratio_threshold: config.blank_ratio_threshold,
            large_file_threshold_mb: config.large_file_threshold_mb,
        }
    }

    /// 规范化表格
    ///
    /// # 参数
    /// - grid: 解析阶段产出的原始表格（按值接管）
    /// - data_domain: 数据域提示，偏置关键列关键词组
    /// - file_size_mb: 源文件大小，触发大文件模式
    ///
    /// # 错误
    /// - ForcedFillFirstRowBlank: 关键列第一行为空（表头行配置错误），
    ///   硬失败，不返回部分填充的表格
    pub fn normalize(
        &self,
        mut grid: RawGrid,
        data_domain: Option<&str>,
        file_size_mb: f64,
    ) -> IngestResult<(RawGrid, NormalizationReport)> {
        let is_large_file = file_size_mb > self.large_file_threshold_mb;
        let strategy = if is_large_file {
            FillStrategy::LargeFileKeyColumnsOnly
        } else {
            FillStrategy::EnhancedFfill
        };

        if grid.is_empty() {
            return Ok((grid, NormalizationReport::empty(strategy)));
        }

        let kw = keywords_for(data_domain);
        let mut report = NormalizationReport::empty(strategy);

        // 先做一遍只读评估，关键列首行校验在任何填充发生之前完成
        let mut fill_plan: Vec<(usize, bool)> = Vec::new();
        for (idx, header) in grid.headers.iter().enumerate() {
            // 黑名单：度量列不填充
            if kw.is_never_fill(header) {
                continue;
            }

            // 仅处理字符串/混合列，不改变列类型
            if !grid.column_has_text(idx) {
                continue;
            }

            let is_key = kw.is_key_column(header);

            // 大文件模式：非关键列直接跳过
            if is_large_file && !is_key {
                continue;
            }

            let should_fill = if is_key {
                // 关键列第一行为空 ⇒ 表头行配置错误，立刻硬失败
                if grid.rows[0][idx].is_blank() {
                    return Err(IngestError::ForcedFillFirstRowBlank {
                        column: header.clone(),
                    });
                }
                true
            } else {
                grid.blank_ratio(idx) > self.blank_ratio_threshold || kw.is_bias_fill(header)
            };

            if should_fill {
                fill_plan.push((idx, is_key));
            }
        }

        // 再执行前向填充
        for (idx, is_key) in fill_plan {
            let filled = forward_fill_column(&mut grid, idx);
            if filled > 0 {
                let header = grid.headers[idx].clone();
                debug!(column = %header, filled, key = is_key, "列填充完成");
                report.filled_columns.push(header.clone());
                report.filled_cells += filled;
                if is_key {
                    report.key_columns.push(header.clone());
                }
                report.columns.push(ColumnFillReport {
                    column: header,
                    filled_cells: filled,
                    key_column: is_key,
                });
            }
        }

        info!(
            strategy = report.strategy.as_str(),
            filled_columns = report.filled_columns.len(),
            filled_cells = report.filled_cells,
            "表格规范化完成"
        );

        Ok((grid, report))
    }
}

/// 对单列执行前向填充，返回新填充的单元格数。
/// 空串视为空白参与填充；无前值可用的前导空白保持原样
fn forward_fill_column(grid: &mut RawGrid, idx: usize) -> usize {
    let mut carry: Option<CellValue> = None;
    let mut filled = 0usize;

    for row in grid.rows.iter_mut() {
        let cell = &mut row[idx];
        if cell.is_blank() {
            if let Some(value) = &carry {
                *cell = value.clone();
                filled += 1;
            }
        } else {
            carry = Some(cell.clone());
        }
    }

    filled
}
