use super::model::{Company, FilterCriteria, Product};
use std::collections::BTreeSet;

/// 可被目录过滤器处理的记录
pub trait Catalogued {
    /// 所有提供的条件都需满足（AND）
    fn matches(&self, criteria: &FilterCriteria) -> bool;
    /// 品牌优先排序时使用的名称
    fn priority_key(&self) -> &str;
}

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

/// 空串与 None 都表示不限；其余按原文精确比较
fn eq_or_wildcard(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted.as_deref() {
        None | Some("") => true,
        Some(w) => actual == Some(w),
    }
}

impl Catalogued for Product {
    fn matches(&self, c: &FilterCriteria) -> bool {
        let needle = c.search.to_lowercase();
        if !needle.is_empty()
            && !contains_ci(self.product_name.as_deref(), &needle)
            && !contains_ci(Some(&self.product_code), &needle)
        {
            return false;
        }
        if let Some(hot) = c.hot {
            if self.hot.unwrap_or(false) != hot {
                return false;
            }
        }
        eq_or_wildcard(&c.company, self.company_name.as_deref())
            && eq_or_wildcard(&c.category, self.category_name.as_deref())
            && eq_or_wildcard(&c.product_type, self.product_type.as_deref())
            && eq_or_wildcard(&c.status, self.sell_status.as_deref())
            && eq_or_wildcard(&c.region, self.region.as_deref())
    }

    fn priority_key(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }
}

impl Catalogued for Company {
    fn matches(&self, c: &FilterCriteria) -> bool {
        let needle = c.search.to_lowercase();
        if !needle.is_empty()
            && !contains_ci(self.name.as_deref(), &needle)
            && !contains_ci(Some(&self.code), &needle)
            && !contains_ci(self.region.as_deref(), &needle)
        {
            return false;
        }
        eq_or_wildcard(&c.region, self.region.as_deref())
    }

    fn priority_key(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// 过滤并保持原有相对顺序；给出优先列表时做稳定的局部重排
pub fn filter_records<T: Catalogued + Clone>(
    records: &[T],
    criteria: &FilterCriteria,
    priority: Option<&[String]>,
) -> Vec<T> {
    let filtered: Vec<T> = records
        .iter()
        .filter(|r| r.matches(criteria))
        .cloned()
        .collect();
    match priority {
        Some(list) if !list.is_empty() => prioritize(filtered, list),
        _ => filtered,
    }
}

/// 优先列表中的记录按列表顺序移到最前，其余保持原相对顺序
pub fn prioritize<T: Catalogued>(mut records: Vec<T>, priority: &[String]) -> Vec<T> {
    // sort_by_key 是稳定排序，同组内不改变原顺序
    records.sort_by_key(|r| {
        priority
            .iter()
            .position(|p| p == r.priority_key())
            .unwrap_or(usize::MAX)
    });
    records
}

/// 过滤选择器可用的取值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFacets {
    pub companies: Vec<String>,
    pub categories: Vec<String>,
    pub types: Vec<String>,
    pub statuses: Vec<String>,
}

pub fn product_facets(products: &[Product]) -> ProductFacets {
    let mut companies = BTreeSet::new();
    let mut categories = BTreeSet::new();
    let mut types = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    for p in products {
        let pairs = [
            (&mut companies, &p.company_name),
            (&mut categories, &p.category_name),
            (&mut types, &p.product_type),
            (&mut statuses, &p.sell_status),
        ];
        for (set, value) in pairs {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                set.insert(v.to_string());
            }
        }
    }
    ProductFacets {
        companies: companies.into_iter().collect(),
        categories: categories.into_iter().collect(),
        types: types.into_iter().collect(),
        statuses: statuses.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(code: &str, company: &str) -> Product {
        Product {
            product_code: code.to_string(),
            product_name: Some(format!("{} plan", code)),
            company_name: Some(company.to_string()),
            category_name: Some("Savings".to_string()),
            product_type: Some("BASIC".to_string()),
            sell_status: Some("SELLING".to_string()),
            ..Default::default()
        }
    }

    fn company(name: &str) -> Company {
        Company {
            code: name.to_lowercase(),
            name: Some(name.to_string()),
            region: Some("HK".to_string()),
            ..Default::default()
        }
    }

    fn mixed_products() -> Vec<Product> {
        let owners = [
            "AXA", "AIA", "FWD", "Chubb", "AIA", "Manulife", "AXA", "AIA", "FWD", "Sunlife",
        ];
        owners
            .iter()
            .enumerate()
            .map(|(i, c)| product(&format!("P{}", i), c))
            .collect()
    }

    #[test]
    fn company_filter_keeps_original_order() {
        let criteria = FilterCriteria {
            company: Some("AIA".to_string()),
            ..Default::default()
        };
        let out = filter_records(&mixed_products(), &criteria, None);
        let codes: Vec<&str> = out.iter().map(|p| p.product_code.as_str()).collect();
        assert_eq!(codes, vec!["P1", "P4", "P7"]);
    }

    #[test]
    fn filtering_is_idempotent_and_a_subset() {
        let criteria = FilterCriteria {
            search: "p1".to_string(),
            ..Default::default()
        };
        let input = mixed_products();
        let once = filter_records(&input, &criteria, None);
        let twice = filter_records(&once, &criteria, None);
        assert_eq!(once, twice);
        assert!(once.iter().all(|p| input.contains(p)));
    }

    #[test]
    fn search_is_case_insensitive_on_name_or_code() {
        let mut p = product("AIA:2I1OLP", "AIA");
        p.product_name = Some("Global Wealth".to_string());
        let by_name = FilterCriteria {
            search: "WEALTH".to_string(),
            ..Default::default()
        };
        let by_code = FilterCriteria {
            search: "2i1olp".to_string(),
            ..Default::default()
        };
        assert!(p.matches(&by_name));
        assert!(p.matches(&by_code));
    }

    #[test]
    fn search_text_is_matched_verbatim() {
        let p = product("AIA:1", "AIA");
        let padded = FilterCriteria {
            search: " plan".to_string(),
            ..Default::default()
        };
        let leading = FilterCriteria {
            search: " aia".to_string(),
            ..Default::default()
        };
        // 名称是 "AIA:1 plan"，空格只出现在 plan 前
        assert!(p.matches(&padded));
        assert!(!p.matches(&leading));

        let blank = FilterCriteria {
            search: "   ".to_string(),
            ..Default::default()
        };
        assert!(!p.matches(&blank));
        assert!(!company("AIA").matches(&blank));
    }

    #[test]
    fn all_predicates_must_hold() {
        let p = product("X", "AIA");
        let criteria = FilterCriteria {
            company: Some("AIA".to_string()),
            status: Some("STOPPED".to_string()),
            ..Default::default()
        };
        assert!(!p.matches(&criteria));
    }

    #[test]
    fn hot_flag_treats_missing_as_false() {
        let mut hot = product("H", "AIA");
        hot.hot = Some(true);
        let cold = product("C", "AIA");
        let criteria = FilterCriteria {
            hot: Some(true),
            ..Default::default()
        };
        let out = filter_records(&[hot, cold], &criteria, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_code, "H");
    }

    #[test]
    fn company_search_covers_region() {
        let mut c = company("AIA");
        c.region = Some("Macau".to_string());
        let criteria = FilterCriteria {
            search: "mac".to_string(),
            ..Default::default()
        };
        assert!(c.matches(&criteria));
    }

    #[test]
    fn company_ignores_product_only_predicates() {
        let criteria = FilterCriteria {
            category: Some("Savings".to_string()),
            ..Default::default()
        };
        assert!(company("AIA").matches(&criteria));
    }

    #[test]
    fn priority_moves_listed_names_to_front() {
        let input = vec![company("B"), company("A"), company("C")];
        let priority = vec!["A".to_string(), "B".to_string()];
        let out = filter_records(&input, &FilterCriteria::default(), Some(&priority));
        let names: Vec<&str> = out.iter().map(|c| c.priority_key()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn priority_reorder_is_stable_for_others() {
        let priority = vec!["AIA".to_string()];
        let out = prioritize(mixed_products(), &priority);
        let codes: Vec<&str> = out.iter().map(|p| p.product_code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["P1", "P4", "P7", "P0", "P2", "P3", "P5", "P6", "P8", "P9"]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out: Vec<Product> = filter_records(&[], &FilterCriteria::default(), None);
        assert!(out.is_empty());
    }

    #[test]
    fn facets_are_distinct_and_sorted() {
        let facets = product_facets(&mixed_products());
        assert_eq!(
            facets.companies,
            vec!["AIA", "AXA", "Chubb", "FWD", "Manulife", "Sunlife"]
        );
        assert_eq!(facets.types, vec!["BASIC"]);
    }
}
