use crate::catalog::model::null_as_default;
use serde::{Deserialize, Serialize};

/// 可选基金（与后端约定的名称一致）
pub const FUND_CHOICES: [&str; 3] = [
    "聯博 - 美元收益基金 AA",
    "安聯收益及增長基金AM類 （H2-歐元對沖）收息",
    "富蘭克林入息基金",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FundIssue {
    pub issue_date: Option<String>,
    pub deadline_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Fund {
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issues: Vec<FundIssue>,
}

/// 与 issues 按下标一一对应的提醒邮件日期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailDateEntry {
    pub date: String,
    pub is_enabled: bool,
    pub is_sent: bool,
}

/// 勾选了“发送邮件”的基金集合，保持勾选顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailSelection {
    names: Vec<String>,
}

impl MailSelection {
    pub fn from_names(names: Vec<String>) -> Self {
        let mut sel = Self::default();
        for n in names {
            sel.set(&n, true);
        }
        sel
    }

    pub fn set(&mut self, fund_name: &str, checked: bool) {
        if checked {
            if !self.contains(fund_name) {
                self.names.push(fund_name.to_string());
            }
        } else {
            self.names.retain(|n| n != fund_name);
        }
    }

    pub fn toggle(&mut self, fund_name: &str) {
        let checked = !self.contains(fund_name);
        self.set(fund_name, checked);
    }

    pub fn contains(&self, fund_name: &str) -> bool {
        self.names.iter().any(|n| n == fund_name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// 按下标或名称解析基金（下标从 1 开始）
pub fn resolve_fund_choice(token: &str) -> Option<&'static str> {
    let t = token.trim();
    if let Ok(idx) = t.parse::<usize>() {
        return idx.checked_sub(1).and_then(|i| FUND_CHOICES.get(i)).copied();
    }
    FUND_CHOICES.iter().copied().find(|f| *f == t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_json_uses_snake_case_issue_fields() {
        let json = r#"{"name":"F","issues":[{"issue_date":"2024-01-02","deadline_date":"2024-01-09"}]}"#;
        let fund: Fund = serde_json::from_str(json).unwrap();
        assert_eq!(fund.issues[0].deadline_date.as_deref(), Some("2024-01-09"));
    }

    #[test]
    fn email_date_entry_uses_camel_case() {
        let json = r#"{"date":"2024/01/01","isEnabled":true,"isSent":false}"#;
        let e: EmailDateEntry = serde_json::from_str(json).unwrap();
        assert!(e.is_enabled);
        assert!(!e.is_sent);
    }

    #[test]
    fn mail_selection_add_is_idempotent() {
        let mut sel = MailSelection::default();
        sel.set("A", true);
        sel.set("A", true);
        sel.set("B", true);
        assert_eq!(sel.names(), &["A".to_string(), "B".to_string()]);
        sel.set("A", false);
        assert_eq!(sel.names(), &["B".to_string()]);
        sel.toggle("B");
        assert!(sel.names().is_empty());
    }

    #[test]
    fn fund_choice_by_index_or_name() {
        assert_eq!(resolve_fund_choice("1"), Some(FUND_CHOICES[0]));
        assert_eq!(resolve_fund_choice("0"), None);
        assert_eq!(resolve_fund_choice("4"), None);
        assert_eq!(resolve_fund_choice("富蘭克林入息基金"), Some(FUND_CHOICES[2]));
    }
}
