// ==========================================
// 电商报表摄取引擎 - 原始表格
// ==========================================
// 职责: 解析阶段产出的有序表格（表头 + 数据行）
// 所有权: 各流水线阶段按值接管，不原地共享
// ==========================================

use serde::{Deserialize, Serialize};

/// 松散类型的单元格值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    /// 空白判定：Blank 或去除空白后为空的字符串
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 文本视图（数值按通用格式渲染，空白为空字符串）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                // 整数值不带小数尾巴（订单号等常被 Excel 存成浮点）
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Blank => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s.trim().to_string())
        }
    }
}

/// 原始表格：一行表头 + 有序数据行。行内列序与源文件一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGrid {
    /// 表头（可能包含空白表头，由字段映射阶段过滤）
    pub headers: Vec<String>,
    /// 数据行。行长与表头对齐（解析阶段已补齐/截断）
    pub rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Blank);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// 某列的全部单元格（按行序）
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// 某列空白单元格占比
    pub fn blank_ratio(&self, idx: usize) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let blanks = self.column(idx).filter(|c| c.is_blank()).count();
        blanks as f64 / self.rows.len() as f64
    }

    /// 某列是否包含至少一个文本单元格（字符串/混合型列才参与填充）
    pub fn column_has_text(&self, idx: usize) -> bool {
        self.column(idx)
            .any(|c| matches!(c, CellValue::Text(s) if !s.trim().is_empty()))
    }
}
