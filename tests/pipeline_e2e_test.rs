// ==========================================
// 集成测试: 摄取流水线端到端
// ==========================================
// 覆盖: 解析 → 规范化 → 字段映射 → 记录投影 全链路
// ==========================================

mod common;

use common::Cell;
use ecom_ingest::{
    CellValue, DetectedFormat, EngineConfig, FillStrategy, IngestError, IngestOptions,
    IngestPipeline, ResolutionMethod, StrategyKind,
};
use tempfile::TempDir;

fn pipeline(dir: &TempDir) -> IngestPipeline {
    pipeline_with(dir, EngineConfig::default())
}

fn pipeline_with(dir: &TempDir, mut config: EngineConfig) -> IngestPipeline {
    config.repair_cache_dir = Some(dir.path().join("repair_cache"));
    IngestPipeline::new(config)
}

fn orders_options() -> IngestOptions {
    IngestOptions {
        data_domain: Some("orders".to_string()),
        ..IngestOptions::default()
    }
}

/// 合并单元格订单导出: 订单号只在每组首行出现
fn merged_order_rows() -> Vec<Vec<Cell>> {
    vec![
        vec![
            Cell::T("订单号"),
            Cell::T("产品名称"),
            Cell::T("数量"),
            Cell::T("实付金额"),
        ],
        vec![Cell::T("1001"), Cell::T("连衣裙"), Cell::N(2.0), Cell::N(118.0)],
        vec![Cell::B, Cell::T("腰带"), Cell::N(1.0), Cell::B],
        vec![Cell::B, Cell::T("丝巾"), Cell::N(1.0), Cell::B],
        vec![Cell::T("1002"), Cell::T("衬衫"), Cell::N(1.0), Cell::N(89.0)],
    ]
}

#[test]
fn test_merged_cell_order_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.xlsx");
    common::write_xlsx(&path, &merged_order_rows());

    let output = pipeline(&dir).ingest(&path, &orders_options()).unwrap();

    assert_eq!(output.format, DetectedFormat::Zip);
    assert_eq!(output.records.len(), 4);

    // 关键列强制填充: 明细行继承组首的订单号
    assert_eq!(output.records[1]["order_id"], CellValue::Text("1001".into()));
    assert_eq!(output.records[2]["order_id"], CellValue::Text("1001".into()));
    assert_eq!(output.records[3]["order_id"], CellValue::Text("1002".into()));
    assert!(output.normalization.key_columns.contains(&"订单号".to_string()));

    // 度量列绝不填充: 明细行金额保持空白
    assert_eq!(output.records[1]["paid_amount"], CellValue::Blank);
    assert_eq!(output.records[2]["paid_amount"], CellValue::Blank);
    assert_eq!(output.records[0]["paid_amount"], CellValue::Number(118.0));

    // 表头全部精确命中
    let codes: Vec<&str> = output.columns.iter().map(|c| c.field_code.as_str()).collect();
    assert_eq!(codes, vec!["order_id", "product_name", "quantity", "paid_amount"]);
    assert!(output
        .columns
        .iter()
        .all(|c| c.method == ResolutionMethod::Exact));
    assert!(output.resolution.unmapped.is_empty());
}

#[test]
fn test_noise_headers_excluded_from_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("traffic.xlsx");
    common::write_xlsx(
        &path,
        &[
            vec![
                Cell::T("日期"),
                Cell::T("2025-01-01 ~ 2025-01-31"),
                Cell::T("浏览量"),
                Cell::T("Unnamed: 3"),
            ],
            vec![Cell::T("2025-01-01"), Cell::T("噪声"), Cell::N(120.0), Cell::B],
            vec![Cell::T("2025-01-02"), Cell::T("噪声"), Cell::N(98.0), Cell::B],
        ],
    );

    let output = pipeline(&dir)
        .ingest(&path, &IngestOptions::default())
        .unwrap();

    assert_eq!(output.resolution.total_headers, 4);
    assert_eq!(output.resolution.filtered.len(), 2);
    assert_eq!(output.columns.len(), 2);

    // 被过滤列的数据不进入记录
    assert_eq!(output.records[0].len(), 2);
    assert_eq!(output.records[0]["metric_date"], CellValue::Text("2025-01-01".into()));
    assert_eq!(output.records[0]["page_views"], CellValue::Number(120.0));
}

#[test]
fn test_html_disguised_ingest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.xls");
    common::write_html_table(
        &path,
        &[
            vec!["订单号", "订单状态"],
            vec!["1001", "已发货"],
            vec!["1002", "已签收"],
        ],
    );

    let output = pipeline(&dir).ingest(&path, &orders_options()).unwrap();
    assert_eq!(output.format, DetectedFormat::HtmlDisguised);
    assert_eq!(output.attempts[0].strategy, StrategyKind::Html);
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0]["order_id"], CellValue::Text("1001".into()));
    assert_eq!(output.records[1]["order_status"], CellValue::Text("已签收".into()));
}

#[test]
fn test_repaired_ole_ingest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.xls");
    common::write_repairable_ole(&path, &merged_order_rows());

    let output = pipeline(&dir).ingest(&path, &orders_options()).unwrap();

    assert_eq!(output.format, DetectedFormat::OleBinary);
    assert!(!output.attempts[0].succeeded);
    assert_eq!(output.attempts[0].strategy, StrategyKind::Xls);
    let last = output.attempts.last().unwrap();
    assert_eq!(last.strategy, StrategyKind::RepairedRetry);
    assert!(last.succeeded);

    // 修复重入后规范化照常生效
    assert_eq!(output.records[1]["order_id"], CellValue::Text("1001".into()));
}

#[test]
fn test_unreadable_file_is_hard_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hopeless.xls");
    common::write_hopeless_ole(&path);

    let result = pipeline(&dir).ingest(&path, &orders_options());
    assert!(matches!(result, Err(IngestError::UnreadableFile { .. })));
}

#[test]
fn test_large_file_mode_skips_non_key_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.xlsx");
    common::write_xlsx(
        &path,
        &[
            vec![Cell::T("订单号"), Cell::T("物流渠道")],
            vec![Cell::T("1001"), Cell::T("标准快递")],
            vec![Cell::B, Cell::B],
            vec![Cell::T("1002"), Cell::B],
        ],
    );

    // 阈值压到 0，任何文件都按大文件处理
    let config = EngineConfig {
        large_file_threshold_mb: 0.0,
        ..EngineConfig::default()
    };
    let output = pipeline_with(&dir, config)
        .ingest(&path, &orders_options())
        .unwrap();

    assert_eq!(output.normalization.strategy, FillStrategy::LargeFileKeyColumnsOnly);
    // 关键列照常填充
    assert_eq!(output.records[1]["order_id"], CellValue::Text("1001".into()));
    // 非关键列原样透传，即便空白占比超过启发阈值
    assert_eq!(output.records[1]["wu_liu_qu_dao"], CellValue::Blank);
    assert_eq!(output.records[2]["wu_liu_qu_dao"], CellValue::Blank);
}

#[test]
fn test_first_row_blank_key_column_fails_whole_ingest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("misconfigured.xlsx");
    common::write_xlsx(
        &path,
        &[
            vec![Cell::T("订单号"), Cell::T("产品名称")],
            vec![Cell::B, Cell::T("连衣裙")],
            vec![Cell::T("1001"), Cell::T("衬衫")],
        ],
    );

    let result = pipeline(&dir).ingest(&path, &orders_options());
    assert!(matches!(
        result,
        Err(IngestError::ForcedFillFirstRowBlank { ref column }) if column == "订单号"
    ));
}

#[test]
fn test_header_row_and_row_limit_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("banner.xlsx");
    common::write_xlsx(
        &path,
        &[
            vec![Cell::T("店铺报表导出")],
            vec![Cell::T("订单号"), Cell::T("实付金额")],
            vec![Cell::T("1001"), Cell::N(1.0)],
            vec![Cell::T("1002"), Cell::N(2.0)],
            vec![Cell::T("1003"), Cell::N(3.0)],
        ],
    );

    let options = IngestOptions {
        data_domain: Some("orders".to_string()),
        header_row: 1,
        row_limit: Some(2),
    };
    let output = pipeline(&dir).ingest(&path, &options).unwrap();
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[1]["order_id"], CellValue::Text("1002".into()));
}

#[test]
fn test_output_serializes_to_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.xlsx");
    common::write_xlsx(&path, &merged_order_rows());

    let output = pipeline(&dir).ingest(&path, &orders_options()).unwrap();
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["format"], "zip");
    assert_eq!(json["attempts"][0]["strategy"], "xlsx");
    assert_eq!(json["normalization"]["strategy"], "enhanced_ffill");
    assert_eq!(json["records"][1]["order_id"], "1001");
}
