// ==========================================
// 电商报表摄取引擎 - 规范字段辞典
// ==========================================
// 职责: 规范字段参照数据。会话期只读快照，构造注入，引擎绝不修改
// 来源: 内置业务词表，或外部辞典服务导出的 JSON 快照
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 一个规范字段。长生命周期参照数据，由外部管理端维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMappingEntry {
    /// 规范字段代码（在数据域内全局唯一）
    pub field_code: String,
    /// 人类可读标签（精确匹配候选之一）
    pub label: String,
    /// 所属数据域，"general" 表示全域可用
    #[serde(default = "default_domain")]
    pub data_domain: String,
    /// 同义词（精确匹配候选）
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// 按数据域的同义词覆写（域命中时优先于通用同义词）
    #[serde(default)]
    pub domain_synonyms: HashMap<String, Vec<String>>,
    /// 度量列标记（事实而非维度，属于永不填充黑名单）
    #[serde(default)]
    pub is_measure: bool,
}

fn default_domain() -> String {
    "general".to_string()
}

/// 字段辞典快照。会话开始时加载一次，会话期内不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDictionary {
    entries: Vec<FieldMappingEntry>,
}

/// 某数据域下的解析视图：精确查找表 + 按长度降序的同义词序列。
/// 长度降序保证短而泛的同义词不会抢占更具体的多词匹配
#[derive(Debug)]
pub struct DomainView {
    exact: HashMap<String, String>,
    by_len: Vec<(String, String)>,
}

impl DomainView {
    /// 精确匹配：表头逐字等于标签或某同义词
    pub fn lookup_exact(&self, header: &str) -> Option<&str> {
        self.exact.get(header).map(String::as_str)
    }

    /// 按长度降序遍历 (同义词, 字段代码)
    pub fn synonyms_by_len(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_len.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }
}

impl FieldDictionary {
    pub fn new(entries: Vec<FieldMappingEntry>) -> Self {
        Self { entries }
    }

    /// 从外部辞典服务导出的 JSON 快照加载
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn entries(&self) -> &[FieldMappingEntry] {
        &self.entries
    }

    /// 构建数据域解析视图。
    /// 候选收录顺序: 域同义词覆写 → 标签/通用同义词（先到先得），
    /// 再按字符长度稳定降序排序
    pub fn domain_view(&self, data_domain: Option<&str>) -> DomainView {
        let domain = data_domain.map(str::to_lowercase);

        let in_domain = |entry: &FieldMappingEntry| -> bool {
            match &domain {
                Some(d) => entry.data_domain == "general" || entry.data_domain.eq_ignore_ascii_case(d),
                None => true,
            }
        };

        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut push = |pairs: &mut Vec<(String, String)>,
                        seen: &mut HashSet<String>,
                        key: &str,
                        code: &str| {
            let key = key.trim();
            if !key.is_empty() && seen.insert(key.to_string()) {
                pairs.push((key.to_string(), code.to_string()));
            }
        };

        // 域覆写优先收录
        if let Some(d) = &domain {
            for entry in self.entries.iter().filter(|e| in_domain(e)) {
                if let Some(overrides) = entry.domain_synonyms.get(d) {
                    for synonym in overrides {
                        push(&mut pairs, &mut seen, synonym, &entry.field_code);
                    }
                }
            }
        }

        for entry in self.entries.iter().filter(|e| in_domain(e)) {
            push(&mut pairs, &mut seen, &entry.label, &entry.field_code);
            for synonym in &entry.synonyms {
                push(&mut pairs, &mut seen, synonym, &entry.field_code);
            }
        }

        let exact: HashMap<String, String> = pairs.iter().cloned().collect();

        let mut by_len = pairs;
        // 稳定排序: 等长时保持收录顺序
        by_len.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        DomainView { exact, by_len }
    }

    /// 内置业务词表（源自历史报表扫描沉淀的中英文对照）
    pub fn builtin() -> Self {
        fn dim(code: &str, label: &str, synonyms: &[&str]) -> FieldMappingEntry {
            FieldMappingEntry {
                field_code: code.to_string(),
                label: label.to_string(),
                data_domain: "general".to_string(),
                synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                domain_synonyms: HashMap::new(),
                is_measure: false,
            }
        }
        fn measure(code: &str, label: &str, synonyms: &[&str]) -> FieldMappingEntry {
            FieldMappingEntry {
                is_measure: true,
                ..dim(code, label, synonyms)
            }
        }
        fn with_domain_syn(
            mut entry: FieldMappingEntry,
            domain: &str,
            synonyms: &[&str],
        ) -> FieldMappingEntry {
            entry.domain_synonyms.insert(
                domain.to_string(),
                synonyms.iter().map(|s| s.to_string()).collect(),
            );
            entry
        }

        Self::new(vec![
            // 时间相关
            dim("metric_date", "日期", &["统计日期"]),
            dim("order_date_local", "订单日期", &["下单日期"]),
            dim("service_date", "费用日期", &[]),
            dim("order_time_utc", "时间", &["订单时间", "下单时间"]),
            dim("payment_time", "付款时间", &[]),
            dim("ship_time", "发货时间", &[]),
            dim("settlement_time", "结算时间", &[]),
            dim("purchase_time", "采购时间", &[]),
            // 订单相关
            with_domain_syn(
                dim("order_id", "订单号", &["订单编号"]),
                "orders",
                &["单号"],
            ),
            dim("order", "订单", &[]),
            measure("order_amount", "订单金额", &[]),
            dim("order_status", "订单状态", &[]),
            dim("order_info", "订单信息", &[]),
            // 产品相关
            dim("product", "产品", &["商品"]),
            dim("product_name", "产品名称", &["商品名称"]),
            dim("product_title", "产品标题", &[]),
            dim("product_platform_title", "平台产品标题", &[]),
            with_domain_syn(dim("sku", "SKU", &[]), "products", &["货号"]),
            dim("platform_sku", "平台SKU", &[]),
            dim("product_sku", "商品SKU", &[]),
            measure("price", "价格", &["售价"]),
            measure("original_price", "原价", &[]),
            measure("discounted_price", "折后价格", &[]),
            measure("stock", "库存", &[]),
            dim("specification", "规格", &[]),
            dim("spec_name", "规格名称", &[]),
            dim("spec_code", "规格编号", &[]),
            dim("spec_sku", "规格货号", &[]),
            // 金额相关
            measure("amount", "金额", &[]),
            measure("total_amount", "总金额", &[]),
            measure("paid_amount", "实付金额", &[]),
            measure("refund_amount", "退款金额", &[]),
            measure("cost", "成本", &[]),
            measure("purchase_cost", "采购成本", &[]),
            measure("operation_cost", "运营成本", &[]),
            measure("other_cost", "其他成本", &[]),
            measure("advertising_cost", "广告成本", &[]),
            measure("profit", "利润", &[]),
            measure("gross_profit_rate", "毛利率", &[]),
            measure("sales_profit_rate", "销售利润率", &[]),
            measure("cost_profit_rate", "成本利润率", &[]),
            // 运费相关
            measure("shipping_fee", "运费", &[]),
            measure("actual_shipping_fee", "实际运费", &[]),
            measure("shipping_cost", "运费成本", &[]),
            measure("shipping_compensation", "运费补偿", &[]),
            measure("shipping_rebate", "运费回扣", &[]),
            measure("shipping_adjustment", "运费调整", &[]),
            measure("shipping_discount", "运费折扣", &[]),
            measure("shipping_subsidy", "运费补贴", &[]),
            // 数量相关
            measure("quantity", "数量", &[]),
            measure("total", "总数", &[]),
            measure("transaction_count", "成交件数", &[]),
            measure("sales_quantity", "销售数量", &[]),
            measure("outbound_quantity", "出库数量", &[]),
            measure("piece_count", "件数", &[]),
            // 流量相关
            measure("page_views", "浏览量", &["访问次数"]),
            measure("visitors", "访客数", &["访客"]),
            measure("new_visitors", "新访客", &[]),
            measure("avg_visitors", "平均访客数", &[]),
            measure("avg_service_visitors", "平均服务的访客人数", &[]),
            measure("avg_time_on_page", "平均停留时长", &[]),
            measure("avg_page_views", "平均页面访问数", &[]),
            measure("avg_conversion_rate", "平均转化率", &[]),
            measure("bounce_rate", "跳出率", &[]),
            measure("conversion_rate", "转化率", &[]),
            measure("click_rate", "点击率", &[]),
            measure("impressions", "曝光次数", &[]),
            // 平台相关
            dim("platform_code", "平台", &[]),
            dim("shop_id", "店铺", &[]),
            dim("account", "账号", &[]),
            dim("site", "站点", &[]),
            // 服务相关
            measure("service_fee", "服务费", &[]),
            measure("commission", "佣金", &[]),
            measure("platform_commission", "平台佣金", &[]),
            measure("commission_compensation", "佣金补偿", &[]),
            measure("commission_discount", "佣金折扣", &[]),
            measure("commission_adjustment", "佣金调整", &[]),
            // 其他
            dim("status", "状态", &[]),
            dim("type", "类型", &[]),
            dim("remark", "备注", &[]),
            dim("description", "说明", &[]),
            dim("compensation", "补偿", &[]),
            dim("adjustment", "调整", &[]),
            dim("discount", "折扣", &[]),
            dim("subsidy", "补贴", &[]),
            dim("rebate", "回扣", &[]),
        ])
    }
}
