use super::probe::DocumentProbe;
use crate::catalog::assets::code_to_file_stem;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_ANY_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[Vv](\d{6})").expect("version marker regex"));
static VERSION_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"V\d{6}").expect("upper version marker regex"));

/// 同一文件的两种大小写写法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCandidates {
    pub primary: String,
    pub fallback: String,
}

/// 最终选中的地址及其来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Primary(String),
    Fallback(String),
    /// 两个都探测失败，仍返回主地址
    LastResort(String),
}

impl Resolution {
    pub fn url(&self) -> &str {
        match self {
            Resolution::Primary(u) | Resolution::Fallback(u) | Resolution::LastResort(u) => u,
        }
    }
}

/// 文档库的文件名大小写不统一（v/V + 6 位版本号），需要两种写法都试
pub fn candidate_urls(base_url: &str, code: &str, raw_file_name: &str) -> UrlCandidates {
    let prefix = code_to_file_stem(code);
    let normalized = raw_file_name.replace('%', " ");
    let lower = VERSION_ANY_CASE.replace_all(&normalized, "v$1");
    let upper = VERSION_ANY_CASE.replace_all(&normalized, "V$1");
    let base = base_url.trim_end_matches('/');
    let lower_url = format!("{}/{}_{}", base, prefix, lower);
    let upper_url = format!("{}/{}_{}", base, prefix, upper);

    if VERSION_UPPER.is_match(&normalized) {
        UrlCandidates {
            primary: upper_url,
            fallback: lower_url,
        }
    } else {
        UrlCandidates {
            primary: lower_url,
            fallback: upper_url,
        }
    }
}

/// 产品文档直接拼路径，不做探测
pub fn product_document_url(pdf_base: &str, product_code: &str, file_name: &str) -> String {
    format!(
        "{}/{}_{}",
        pdf_base.trim_end_matches('/'),
        code_to_file_stem(product_code),
        file_name
    )
}

/// 资讯附件：`{id}_{文件名}`，不做探测
pub fn information_document_url(info_base: &str, info_id: &str, file_name: &str) -> String {
    format!("{}/{}_{}", info_base.trim_end_matches('/'), info_id, file_name)
}

pub struct DocumentResolver<P: DocumentProbe> {
    base_url: String,
    probe: P,
}

impl<P: DocumentProbe> DocumentResolver<P> {
    pub fn new(base_url: impl Into<String>, probe: P) -> Self {
        Self {
            base_url: base_url.into(),
            probe,
        }
    }

    /// 先探测主地址，再探测备用地址，各一次；都失败时返回主地址
    pub async fn resolve(&self, code: &str, raw_file_name: &str) -> Resolution {
        let c = candidate_urls(&self.base_url, code, raw_file_name);
        info!("resolve document: primary={} fallback={}", c.primary, c.fallback);

        if self.probe.exists(&c.primary).await {
            return Resolution::Primary(c.primary);
        }
        if self.probe.exists(&c.fallback).await {
            return Resolution::Fallback(c.fallback);
        }
        warn!("两个地址均不可访问，使用主地址: {}", c.primary);
        Resolution::LastResort(c.primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BASE: &str = "https://docs.example.com/company_PDFs";

    /// 记录探测顺序，只有 `present` 中的地址返回存在
    struct FakeProbe {
        present: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(present: &[&str]) -> Self {
            Self {
                present: present.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentProbe for FakeProbe {
        async fn exists(&self, url: &str) -> bool {
            self.calls.lock().unwrap().push(url.to_string());
            self.present.iter().any(|p| p == url)
        }
    }

    #[test]
    fn uppercase_marker_is_primary() {
        let c = candidate_urls(BASE, "AIA:CO", "Report_V202401.pdf");
        assert!(c.primary.ends_with("_V202401.pdf"));
        assert!(c.fallback.ends_with("_v202401.pdf"));
        assert_eq!(c.primary, format!("{}/AIA_CO_Report_V202401.pdf", BASE));
    }

    #[test]
    fn lowercase_marker_is_primary() {
        let c = candidate_urls(BASE, "AIA", "Report_v202401.pdf");
        assert!(c.primary.ends_with("AIA_Report_v202401.pdf"));
        assert!(c.fallback.ends_with("AIA_Report_V202401.pdf"));
    }

    #[test]
    fn percent_signs_become_spaces() {
        let c = candidate_urls(BASE, "AXA", "Annual%Report_V123456.pdf");
        assert!(c.primary.ends_with("AXA_Annual Report_V123456.pdf"));
    }

    #[test]
    fn no_marker_gives_identical_candidates() {
        let c = candidate_urls(BASE, "FWD", "brochure.pdf");
        assert_eq!(c.primary, c.fallback);
    }

    #[test]
    fn five_digits_is_not_a_marker() {
        let c = candidate_urls(BASE, "FWD", "Doc_V12345.pdf");
        assert!(c.primary.ends_with("Doc_V12345.pdf"));
        assert_eq!(c.primary, c.fallback);
    }

    #[tokio::test]
    async fn primary_hit_skips_fallback() {
        let primary = format!("{}/AIA_Report_V202401.pdf", BASE);
        let resolver = DocumentResolver::new(BASE, FakeProbe::new(&[primary.as_str()]));
        let r = resolver.resolve("AIA", "Report_V202401.pdf").await;
        assert_eq!(r, Resolution::Primary(primary.clone()));
        assert_eq!(resolver.probe.calls(), vec![primary]);
    }

    #[tokio::test]
    async fn fallback_is_probed_after_primary_fails() {
        let fallback = format!("{}/AIA_Report_v202401.pdf", BASE);
        let resolver = DocumentResolver::new(BASE, FakeProbe::new(&[fallback.as_str()]));
        let r = resolver.resolve("AIA", "Report_V202401.pdf").await;
        assert_eq!(r, Resolution::Fallback(fallback));
        assert_eq!(resolver.probe.calls().len(), 2);
    }

    #[tokio::test]
    async fn both_missing_returns_primary() {
        let resolver = DocumentResolver::new(BASE, FakeProbe::new(&[]));
        let r = resolver.resolve("AIA", "Report_V202401.pdf").await;
        assert_eq!(
            r,
            Resolution::LastResort(format!("{}/AIA_Report_V202401.pdf", BASE))
        );
        assert_eq!(resolver.probe.calls().len(), 2);
    }

    #[test]
    fn information_attachments_are_prefixed_by_id() {
        assert_eq!(
            information_document_url("https://x/info_PDFs/", "42", "memo.pdf"),
            "https://x/info_PDFs/42_memo.pdf"
        );
    }

    #[test]
    fn product_documents_use_direct_path() {
        assert_eq!(
            product_document_url("/PDFs/", "AIA:2I1OLP", "Brochure.pdf"),
            "/PDFs/AIA_2I1OLP_Brochure.pdf"
        );
    }
}
