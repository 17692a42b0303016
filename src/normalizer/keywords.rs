// ==========================================
// 电商报表摄取引擎 - 域关键词表
// ==========================================
// 职责: 规范化规则所需的三组关键词（度量黑名单 / 关键列 / 启发偏置）
// 按数据域组织为数据表，进程内构建一次，不逐次重建
// ==========================================

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 度量列黑名单：事实列永不填充，填充即捏造数据。与数据域无关
static NEVER_FILL_KEYWORDS: &[&str] = &[
    "price", "amount", "qty", "quantity", "pv", "uv", "stock", "gmv", "rate", "ratio", "percent",
    "pct", "评分", "数量", "金额", "单价", "合计",
];

/// 一个数据域对应的关键词组
#[derive(Debug)]
pub struct DomainKeywords {
    /// 度量黑名单（包含匹配即命中）
    pub never_fill: &'static [&'static str],
    /// 关键列（双向包含匹配即命中，无条件强制填充）
    pub key_columns: &'static [&'static str],
    /// 启发偏置列（非关键列，但倾向填充）
    pub bias_fill: &'static [&'static str],
}

static ORDERS_KEY_COLUMNS: &[&str] = &[
    "订单号",
    "订单编号",
    "订单id",
    "order_id",
    "order_number",
    "order_no",
    "订单日期",
    "下单日期",
    "order_date",
    "date",
    "日期",
    "店铺",
    "shop",
    "shop_id",
    "店铺id",
];

static PRODUCTS_KEY_COLUMNS: &[&str] = &[
    "产品id",
    "商品id",
    "product_id",
    "sku",
    "商品编号",
    "产品编号",
    "日期",
    "date",
    "metric_date",
];

static GENERIC_KEY_COLUMNS: &[&str] = &["id", "编号", "日期", "date", "店铺", "shop"];

static ORDERS_BIAS_FILL: &[&str] = &["status", "状态", "customer", "buyer"];

static EMPTY: &[&str] = &[];

/// 域 → 关键词组。未知域落到通用组
static KEYWORD_TABLE: Lazy<HashMap<&'static str, DomainKeywords>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "orders",
        DomainKeywords {
            never_fill: NEVER_FILL_KEYWORDS,
            key_columns: ORDERS_KEY_COLUMNS,
            bias_fill: ORDERS_BIAS_FILL,
        },
    );
    table.insert(
        "products",
        DomainKeywords {
            never_fill: NEVER_FILL_KEYWORDS,
            key_columns: PRODUCTS_KEY_COLUMNS,
            bias_fill: EMPTY,
        },
    );
    table
});

static GENERIC_KEYWORDS: Lazy<DomainKeywords> = Lazy::new(|| DomainKeywords {
    never_fill: NEVER_FILL_KEYWORDS,
    key_columns: GENERIC_KEY_COLUMNS,
    bias_fill: EMPTY,
});

/// 取数据域的关键词组
pub fn keywords_for(data_domain: Option<&str>) -> &'static DomainKeywords {
    data_domain
        .map(str::to_lowercase)
        .and_then(|d| KEYWORD_TABLE.get(d.as_str()))
        .unwrap_or(&GENERIC_KEYWORDS)
}

impl DomainKeywords {
    /// 度量黑名单匹配（小写包含）
    pub fn is_never_fill(&self, header: &str) -> bool {
        let lower = header.to_lowercase();
        self.never_fill.iter().any(|k| lower.contains(k))
    }

    /// 关键列匹配（小写双向包含: 关键词含于表头 或 表头含于关键词）
    pub fn is_key_column(&self, header: &str) -> bool {
        let lower = header.to_lowercase();
        if lower.is_empty() {
            return false;
        }
        self.key_columns
            .iter()
            .any(|k| lower.contains(k) || k.contains(lower.as_str()))
    }

    /// 启发偏置匹配（小写包含）
    pub fn is_bias_fill(&self, header: &str) -> bool {
        let lower = header.to_lowercase();
        self.bias_fill.iter().any(|k| lower.contains(k))
    }
}
