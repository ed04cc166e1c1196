use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 未选择品牌时的标题栏颜色
pub const DEFAULT_BRAND_COLOR: &str = "green";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Brand {
    Manulife,
    Aia,
    Sunlife,
    Axa,
    Chubb,
    Prudential,
    Fwd,
}

impl Brand {
    pub const ALL: [Brand; 7] = [
        Brand::Manulife,
        Brand::Aia,
        Brand::Sunlife,
        Brand::Axa,
        Brand::Chubb,
        Brand::Prudential,
        Brand::Fwd,
    ];

    pub fn color(&self) -> &'static str {
        match self {
            Brand::Manulife => "#009739",
            Brand::Aia => "#E4002B",
            Brand::Sunlife => "#FFCD00",
            Brand::Axa => "#00008F",
            Brand::Chubb => "#004A9F",
            Brand::Prudential => "#ed1b2e",
            Brand::Fwd => "#e67e22",
        }
    }

    pub fn company(&self) -> &'static str {
        match self {
            Brand::Manulife => "Manulife",
            Brand::Aia => "AIA",
            Brand::Sunlife => "Sunlife",
            Brand::Axa => "AXA",
            Brand::Chubb => "Chubb",
            Brand::Prudential => "Prudential",
            Brand::Fwd => "FWD",
        }
    }

    pub fn from_color(color: &str) -> Option<Brand> {
        Brand::ALL
            .into_iter()
            .find(|b| b.color().eq_ignore_ascii_case(color.trim()))
    }

    /// 接受公司名或颜色值
    pub fn parse(s: &str) -> Option<Brand> {
        let t = s.trim();
        Brand::ALL
            .into_iter()
            .find(|b| b.company().eq_ignore_ascii_case(t))
            .or_else(|| Brand::from_color(t))
    }

    /// 标题栏颜色，"#RRGGBB" 转成 RGB
    pub fn rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(self.color()).unwrap_or((0, 128, 0))
    }
}

pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// 品牌 -> 优先显示的公司名称列表
static BRAND_PRIORITIES: Lazy<HashMap<Brand, Vec<String>>> = Lazy::new(|| {
    Brand::ALL
        .into_iter()
        .map(|b| (b, vec![b.company().to_string()]))
        .collect()
});

pub fn priority_for(brand: Option<Brand>) -> Option<&'static [String]> {
    brand
        .and_then(|b| BRAND_PRIORITIES.get(&b))
        .map(|v| v.as_slice())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    ZhHk,
    ZhCn,
    En,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::ZhHk, Language::ZhCn, Language::En];

    pub fn code(&self) -> &'static str {
        match self {
            Language::ZhHk => "zh-HK",
            Language::ZhCn => "zh-CN",
            Language::En => "en",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::ZhHk => "繁體中文",
            Language::ZhCn => "简体中文",
            Language::En => "English",
        }
    }

    /// 多语言字段里的键名
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Language::ZhHk => "zhHantHK",
            Language::ZhCn => "zhHansCN",
            Language::En => "enUS",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn next(&self) -> Language {
        match self {
            Language::ZhHk => Language::ZhCn,
            Language::ZhCn => Language::En,
            Language::En => Language::ZhHk,
        }
    }
}

/// 取当前语言的名称；缺失时退回 enUS，再退回默认值
pub fn localized<'a>(
    i18n: Option<&'a HashMap<String, String>>,
    default: Option<&'a str>,
    lang: Language,
) -> Option<&'a str> {
    let Some(map) = i18n else {
        return default;
    };
    map.get(lang.i18n_key())
        .or_else(|| map.get(Language::En.i18n_key()))
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .or(default)
}

/// 全局界面状态：品牌、语言、环境与当前用户
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub brand: Option<Brand>,
    pub language: Language,
    pub is_production: bool,
    pub user_email: Option<String>,
    pub admin_emails: Vec<String>,
}

impl AppContext {
    /// 非生产环境，或当前用户在管理员白名单中，才允许切换品牌
    pub fn can_switch_brand(&self) -> bool {
        if !self.is_production {
            return true;
        }
        match self.user_email.as_deref() {
            Some(email) => self
                .admin_emails
                .iter()
                .any(|a| a.eq_ignore_ascii_case(email.trim())),
            None => false,
        }
    }

    pub fn brand_color(&self) -> &'static str {
        self.brand.map(|b| b.color()).unwrap_or(DEFAULT_BRAND_COLOR)
    }

    pub fn priority(&self) -> Option<&'static [String]> {
        priority_for(self.brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_parses_from_name_or_color() {
        assert_eq!(Brand::parse("aia"), Some(Brand::Aia));
        assert_eq!(Brand::parse("#e4002b"), Some(Brand::Aia));
        assert_eq!(Brand::parse("green"), None);
    }

    #[test]
    fn brand_priority_is_a_lookup() {
        assert_eq!(
            priority_for(Some(Brand::Fwd)),
            Some(&["FWD".to_string()][..])
        );
        assert_eq!(priority_for(None), None);
    }

    #[test]
    fn hex_colors_convert_to_rgb() {
        assert_eq!(Brand::Sunlife.rgb(), (0xFF, 0xCD, 0x00));
        assert_eq!(parse_hex_color("green"), None);
    }

    #[test]
    fn localized_name_falls_back() {
        let mut map = HashMap::new();
        map.insert("enUS".to_string(), "AIA Group".to_string());
        map.insert("zhHantHK".to_string(), "友邦".to_string());
        assert_eq!(localized(Some(&map), Some("AIA"), Language::ZhHk), Some("友邦"));
        assert_eq!(
            localized(Some(&map), Some("AIA"), Language::ZhCn),
            Some("AIA Group")
        );
        let empty = HashMap::new();
        assert_eq!(localized(Some(&empty), Some("AIA"), Language::En), Some("AIA"));
        assert_eq!(localized(None, Some("AIA"), Language::En), Some("AIA"));
    }

    #[test]
    fn brand_switch_requires_whitelist_in_production() {
        let mut ctx = AppContext {
            is_production: true,
            user_email: Some("agent@example.com".to_string()),
            admin_emails: vec!["Admin@example.com".to_string()],
            ..Default::default()
        };
        assert!(!ctx.can_switch_brand());
        ctx.user_email = Some("admin@example.com".to_string());
        assert!(ctx.can_switch_brand());
        ctx.is_production = false;
        ctx.user_email = None;
        assert!(ctx.can_switch_brand());
    }

    #[test]
    fn language_codes_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::default().code(), "zh-HK");
    }
}
