use crate::branding::{Brand, Language};
use crate::funds::{resolve_fund_choice, FUND_CHOICES};
use crate::session::UserData;
use crate::storage::repository::PreferenceKey;
use std::str::FromStr;

/// 可单独设置的过滤字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Company,
    Category,
    Type,
    Status,
    Region,
    Hot,
}

impl FilterField {
    pub fn parse(s: &str) -> Option<FilterField> {
        match s.to_ascii_lowercase().as_str() {
            "company" | "c" => Some(FilterField::Company),
            "category" | "cat" => Some(FilterField::Category),
            "type" | "t" => Some(FilterField::Type),
            "status" | "s" => Some(FilterField::Status),
            "region" | "r" => Some(FilterField::Region),
            "hot" | "h" => Some(FilterField::Hot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    Next,
    Prev,
    First,
    Last,
    /// 1 起始的页码
    To(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabTarget {
    Products,
    Companies,
    Funds,
    Settings,
}

impl TabTarget {
    pub fn parse(s: &str) -> Option<TabTarget> {
        match s.to_ascii_lowercase().as_str() {
            "products" | "product" | "p" => Some(TabTarget::Products),
            "companies" | "company" | "c" => Some(TabTarget::Companies),
            "funds" | "fund" | "f" => Some(TabTarget::Funds),
            "settings" | "setting" | "s" => Some(TabTarget::Settings),
            _ => None,
        }
    }
}

/// 文档所属的详情类型，决定使用哪个地址规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocOwner {
    Product,
    Company,
    Information,
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    // 命令行可输入的命令
    Search(String),
    Filter {
        field: FilterField,
        value: Option<String>,
    },
    Clear,
    Page(PageMove),
    Size(Option<usize>),
    Tab(TabTarget),
    Open(Option<usize>),
    Info(String),
    Doc(usize),
    Funds(Vec<String>),
    Mail(String),
    Email(String),
    Days(u8),
    Save,
    Load,
    TestMail,
    Brand(Option<Brand>),
    Lang(Language),
    Help,
    Quit,

    // 界面发往后台的请求
    LoadCatalog,
    LoadProductDetail {
        code: String,
    },
    LoadCompanyDetail {
        code: String,
    },
    LoadInformation {
        id: String,
    },
    ResolveDocument {
        owner: DocOwner,
        code: String,
        file_name: String,
    },
    FetchFunds {
        funds: Vec<String>,
        generation: u64,
    },
    FetchUserData {
        email: String,
    },
    SaveUserData(Box<UserData>),
    SendTestEmail {
        email: String,
    },
    StorePreference {
        key: PreferenceKey,
        value: String,
    },

    Unknown(String),
}

pub const COMMAND_NAMES: [&str; 20] = [
    "search", "filter", "clear", "page", "size", "tab", "open", "info", "doc", "funds", "mail",
    "email", "days", "save", "load", "testmail", "brand", "lang", "help", "quit",
];

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }
        let rest = parts[1..].join(" ");

        match parts[0] {
            "search" | "s" => Ok(AppCommand::Search(rest)),
            "filter" | "f" => {
                let Some(field) = parts.get(1).and_then(|f| FilterField::parse(f)) else {
                    return Ok(AppCommand::Unknown(
                        "用法: filter <company|category|type|status|region|hot> [值]".to_string(),
                    ));
                };
                let value = parts[2..].join(" ");
                if field == FilterField::Hot && !value.is_empty() && parse_bool(&value).is_none() {
                    return Ok(AppCommand::Unknown("用法: filter hot <true|false>".to_string()));
                }
                Ok(AppCommand::Filter {
                    field,
                    value: if value.is_empty() { None } else { Some(value) },
                })
            }
            "clear" => Ok(AppCommand::Clear),
            "page" => match parts.get(1).copied() {
                Some("next") | Some("n") | Some("+") => Ok(AppCommand::Page(PageMove::Next)),
                Some("prev") | Some("p") | Some("-") => Ok(AppCommand::Page(PageMove::Prev)),
                Some("first") => Ok(AppCommand::Page(PageMove::First)),
                Some("last") => Ok(AppCommand::Page(PageMove::Last)),
                Some(n) => match n.parse::<usize>() {
                    Ok(v) if v >= 1 => Ok(AppCommand::Page(PageMove::To(v))),
                    _ => Ok(AppCommand::Unknown(format!("无效页码: {}", n))),
                },
                None => Ok(AppCommand::Unknown(
                    "用法: page <next|prev|first|last|页码>".to_string(),
                )),
            },
            "size" => match parts.get(1) {
                None => Ok(AppCommand::Size(None)),
                Some(n) => match n.parse::<usize>() {
                    Ok(v) => Ok(AppCommand::Size(Some(v))),
                    Err(_) => Ok(AppCommand::Unknown("用法: size [5|10|25|50]".to_string())),
                },
            },
            "tab" => match parts.get(1).and_then(|t| TabTarget::parse(t)) {
                Some(t) => Ok(AppCommand::Tab(t)),
                None => Ok(AppCommand::Unknown(
                    "用法: tab <products|companies|funds|settings>".to_string(),
                )),
            },
            "open" | "o" => match parts.get(1) {
                None => Ok(AppCommand::Open(None)),
                Some(n) => match n.parse::<usize>() {
                    Ok(v) if v >= 1 => Ok(AppCommand::Open(Some(v))),
                    _ => Ok(AppCommand::Unknown("用法: open [行号]".to_string())),
                },
            },
            "info" => match parts.get(1) {
                Some(id) => Ok(AppCommand::Info(id.to_string())),
                None => Ok(AppCommand::Unknown("用法: info <资讯编号>".to_string())),
            },
            "doc" => match parts.get(1).and_then(|n| n.parse::<usize>().ok()) {
                Some(v) if v >= 1 => Ok(AppCommand::Doc(v)),
                _ => Ok(AppCommand::Unknown("用法: doc <文件序号>".to_string())),
            },
            "funds" => {
                if parts.len() == 1 || parts.get(1) == Some(&"none") {
                    return Ok(AppCommand::Funds(Vec::new()));
                }
                if parts.get(1) == Some(&"all") {
                    return Ok(AppCommand::Funds(
                        FUND_CHOICES.iter().map(|s| s.to_string()).collect(),
                    ));
                }
                // 名称里可能有空格：序号可用空格分隔，名称用逗号分隔
                let tokens: Vec<&str> = if rest.contains(',') {
                    rest.split(',').collect()
                } else if parts[1..].iter().all(|t| t.parse::<usize>().is_ok()) {
                    parts[1..].to_vec()
                } else {
                    vec![rest.as_str()]
                };
                let mut picked: Vec<String> = Vec::new();
                for tok in tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
                    match resolve_fund_choice(tok) {
                        Some(name) => {
                            if !picked.iter().any(|p| p == name) {
                                picked.push(name.to_string());
                            }
                        }
                        None => return Ok(AppCommand::Unknown(format!("未知基金: {}", tok))),
                    }
                }
                Ok(AppCommand::Funds(picked))
            }
            "mail" => match resolve_fund_choice(rest.trim()) {
                Some(name) => Ok(AppCommand::Mail(name.to_string())),
                None => Ok(AppCommand::Unknown("用法: mail <基金序号|基金名称>".to_string())),
            },
            "email" => {
                if rest.contains('@') {
                    Ok(AppCommand::Email(rest.trim().to_string()))
                } else {
                    Ok(AppCommand::Unknown("用法: email <邮箱地址>".to_string()))
                }
            }
            "days" => match parts.get(1).and_then(|n| n.parse::<u8>().ok()) {
                Some(v) if (1..=10).contains(&v) => Ok(AppCommand::Days(v)),
                _ => Ok(AppCommand::Unknown("用法: days <1-10>".to_string())),
            },
            "save" => Ok(AppCommand::Save),
            "load" => Ok(AppCommand::Load),
            "testmail" => Ok(AppCommand::TestMail),
            "brand" => match parts.get(1).copied() {
                Some("none") | Some("default") => Ok(AppCommand::Brand(None)),
                Some(b) => match Brand::parse(b) {
                    Some(brand) => Ok(AppCommand::Brand(Some(brand))),
                    None => Ok(AppCommand::Unknown(format!("未知品牌: {}", b))),
                },
                None => Ok(AppCommand::Unknown(
                    "用法: brand <manulife|aia|sunlife|axa|chubb|prudential|fwd|none>".to_string(),
                )),
            },
            "lang" => match parts.get(1).and_then(|c| Language::from_code(c)) {
                Some(l) => Ok(AppCommand::Lang(l)),
                None => Ok(AppCommand::Unknown("用法: lang <zh-HK|zh-CN|en>".to_string())),
            },
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("未知命令: {}", parts[0]))),
        }
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "hot" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub const HELP_LINES: [&str; 12] = [
    "search <关键字>            按名称/代码搜索（空则清除）",
    "filter <字段> [值]         company/category/type/status/region/hot，省略值即清除",
    "clear                      清除全部过滤条件",
    "page <next|prev|n>  size [n]  翻页 / 每页条数 (5,10,25,50)",
    "tab <products|companies|funds|settings>",
    "open [行号]  info <id>  doc <序号>   查看详情、资讯、文档",
    "funds <序号,序号|all|none>  选择基金（输入后 300ms 拉取）",
    "mail <序号>                切换邮件提醒",
    "email <地址>  days <1-10>  邮件设置",
    "save | load | testmail     同步偏好 / 发送测试邮件",
    "brand <名称|none>  lang <zh-HK|zh-CN|en>",
    "help | quit",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AppCommand {
        AppCommand::from_str(s).unwrap()
    }

    #[test]
    fn parses_filter_with_and_without_value() {
        match parse("filter company AIA Group") {
            AppCommand::Filter { field, value } => {
                assert_eq!(field, FilterField::Company);
                assert_eq!(value.as_deref(), Some("AIA Group"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse("filter region"),
            AppCommand::Filter {
                field: FilterField::Region,
                value: None
            }
        ));
        assert!(matches!(parse("filter hot maybe"), AppCommand::Unknown(_)));
        assert!(matches!(parse("filter colour red"), AppCommand::Unknown(_)));
    }

    #[test]
    fn parses_paging() {
        assert!(matches!(parse("page next"), AppCommand::Page(PageMove::Next)));
        assert!(matches!(parse("page 3"), AppCommand::Page(PageMove::To(3))));
        assert!(matches!(parse("page 0"), AppCommand::Unknown(_)));
        assert!(matches!(parse("size"), AppCommand::Size(None)));
        assert!(matches!(parse("size 25"), AppCommand::Size(Some(25))));
    }

    #[test]
    fn parses_fund_selection_by_index_and_dedups() {
        match parse("funds 1, 3, 1") {
            AppCommand::Funds(list) => {
                assert_eq!(list, vec![FUND_CHOICES[0].to_string(), FUND_CHOICES[2].to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("funds 2 3"), AppCommand::Funds(v) if v.len() == 2));
        assert!(matches!(parse("funds none"), AppCommand::Funds(v) if v.is_empty()));
        assert!(matches!(parse("funds all"), AppCommand::Funds(v) if v.len() == 3));
        assert!(matches!(parse("funds 9"), AppCommand::Unknown(_)));
    }

    #[test]
    fn days_must_be_in_range() {
        assert!(matches!(parse("days 10"), AppCommand::Days(10)));
        assert!(matches!(parse("days 0"), AppCommand::Unknown(_)));
        assert!(matches!(parse("days 11"), AppCommand::Unknown(_)));
    }

    #[test]
    fn parses_brand_and_language() {
        assert!(matches!(parse("brand aia"), AppCommand::Brand(Some(Brand::Aia))));
        assert!(matches!(parse("brand none"), AppCommand::Brand(None)));
        assert!(matches!(parse("lang en"), AppCommand::Lang(Language::En)));
        assert!(matches!(parse("lang fr"), AppCommand::Unknown(_)));
    }

    #[test]
    fn unknown_command_is_reported() {
        match parse("frobnicate") {
            AppCommand::Unknown(msg) => assert!(msg.contains("frobnicate")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
