use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// 显式的 `null` 与缺省字段同样处理，取类型默认值
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(deserialize_with = "null_as_default")]
    pub product_code: String,
    pub product_name: Option<String>,
    pub company_name: Option<String>,
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub sell_status: Option<String>,
    pub region: Option<String>,
    pub hot: Option<bool>,
    pub policy_period: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Company {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub desc: Option<String>,
    pub logo: Option<String>,
}

/// 目录列表文件的外层包装：`{ "list": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct CatalogList<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub list: Vec<T>,
}

/// 过滤条件；空字符串或 None 视为通配
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: String,
    pub company: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    pub region: Option<String>,
    pub hot: Option<bool>,
}

impl FilterCriteria {
    pub fn clear(&mut self) {
        *self = FilterCriteria::default();
    }

    /// 界面标题上的简短描述
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("搜索=\"{}\"", self.search));
        }
        let fields = [
            ("company", &self.company),
            ("category", &self.category),
            ("type", &self.product_type),
            ("status", &self.status),
            ("region", &self.region),
        ];
        for (name, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("{}={}", name, v));
            }
        }
        if let Some(hot) = self.hot {
            parts.push(format!("hot={}", hot));
        }
        if parts.is_empty() {
            "ALL".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetailAttribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetailSection {
    pub name: String,
    pub attributes: Vec<DetailAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentFile {
    pub file_name: String,
}

impl DocumentFile {
    pub fn is_pdf(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InformationSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub info_type: String,
    pub title: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDetail {
    pub product_name: Option<String>,
    pub company_name: Option<String>,
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub desc: Option<String>,
    pub logo: Option<String>,
    pub highlights: Vec<String>,
    pub currencies: Vec<String>,
    pub frequencies: Vec<String>,
    pub payment_term: Vec<serde_json::Value>,
    pub details: Vec<DetailSection>,
    pub files: Vec<DocumentFile>,
    pub information: Vec<InformationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditRating {
    pub rating: String,
    pub project: Option<String>,
    pub rating_agency: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyLink {
    pub link: String,
    pub description: Option<String>,
    pub description_i18n: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    pub name: Option<String>,
    pub name_i18n: Option<HashMap<String, String>>,
    pub region: Option<String>,
    pub rank: Option<serde_json::Value>,
    pub desc: Option<String>,
    pub desc_i18n: Option<HashMap<String, String>>,
    pub logo: Option<String>,
    pub credit_ratings: Vec<CreditRating>,
    pub links: Vec<CompanyLink>,
    pub details: Vec<DetailSection>,
    pub files: Vec<DocumentFile>,
    pub information: Vec<InformationSummary>,
}

impl CompanyDetail {
    /// 只保留 PDF 文件
    pub fn pdf_files(&self) -> Vec<&DocumentFile> {
        self.files.iter().filter(|f| f.is_pdf()).collect()
    }

    /// 资讯按时间倒序；无法解析的时间排在最后
    pub fn information_newest_first(&self) -> Vec<InformationSummary> {
        let mut items = self.information.clone();
        items.sort_by(|a, b| {
            let ta = a.time.as_deref().and_then(parse_info_time);
            let tb = b.time.as_deref().and_then(parse_info_time);
            tb.cmp(&ta)
        });
        items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InformationDetail {
    pub id: String,
    #[serde(rename = "type")]
    pub info_type: String,
    pub title: String,
    pub time: Option<String>,
    pub company_name: Option<String>,
    pub tags: Vec<String>,
    pub content: Option<String>,
    #[serde(alias = "attachments")]
    pub files: Vec<DocumentFile>,
}

/// 资讯时间既可能是 RFC3339，也可能是纯日期或毫秒时间戳
pub fn parse_info_time(raw: &str) -> Option<chrono::NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(&raw.replace('/', "-"), "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

/// 显示用的日期：只保留日期部分
pub fn info_date_label(raw: Option<&str>) -> String {
    raw.and_then(parse_info_time)
        .map(|dt| dt.format("%Y/%m/%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
