use crate::error::{DeskError, DeskResult};
use std::path::Path;
use std::time::Duration;

pub const DEV_BACKEND_URL: &str = "http://localhost:7003";
pub const PROD_BACKEND_URL: &str = "https://fundcalendarbackend-production.up.railway.app";
pub const DEFAULT_DOC_BASE_URL: &str =
    "https://my-documents-library.s3.ap-southeast-1.amazonaws.com/company_PDFs";
pub const DEFAULT_INFO_DOC_BASE_URL: &str =
    "https://my-documents-library.s3.ap-southeast-1.amazonaws.com/info_PDFs";

/// 运行配置，全部来自环境变量（可由 .env 提供）
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub is_production: bool,
    pub backend_url: String,
    pub asset_root: String,
    pub doc_base_url: String,
    pub info_doc_base_url: String,
    pub pdf_base_url: String,
    pub database_url: String,
    pub user_email: Option<String>,
    pub admin_emails: Vec<String>,
    pub wp_api_root: Option<String>,
    pub wp_nonce: Option<String>,
    pub http_timeout: Duration,
    pub fetch_debounce: Duration,
}

impl AppConfig {
    pub fn from_env() -> DeskResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 便于测试：从任意键值来源读取
    pub fn from_lookup<F>(get: F) -> DeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let is_production = get("IS_PRODUCTION")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        let backend_url = get("BACKEND_URL").unwrap_or_else(|| {
            if is_production {
                PROD_BACKEND_URL.to_string()
            } else {
                DEV_BACKEND_URL.to_string()
            }
        });
        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                DeskError::Config(format!("HTTP_TIMEOUT_SECS 不是整数: {}", raw))
            })?),
            None => Duration::from_secs(30),
        };
        let admin_emails = get("ADMIN_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            is_production,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            asset_root: get("ASSET_ROOT").unwrap_or_else(|| "public".to_string()),
            doc_base_url: get("DOC_BASE_URL").unwrap_or_else(|| DEFAULT_DOC_BASE_URL.to_string()),
            info_doc_base_url: get("INFO_DOC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_INFO_DOC_BASE_URL.to_string()),
            pdf_base_url: get("PDF_BASE_URL").unwrap_or_else(|| "public/PDFs".to_string()),
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://agentdesk.db?mode=rwc".to_string()),
            user_email: get("USER_EMAIL"),
            admin_emails,
            wp_api_root: get("WP_API_ROOT"),
            wp_nonce: get("WP_NONCE"),
            http_timeout,
            fetch_debounce: Duration::from_millis(300),
        })
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 加载工作目录下的 .env，返回启动信息
pub fn load_env_file(dir: &Path) -> Vec<String> {
    let mut info = Vec::new();
    info.push(format!("当前工作目录: {}", dir.display()));
    let env_path = dir.join(".env");
    if !env_path.exists() {
        info.push(format!("⚠ 未找到 .env 文件: {}", env_path.display()));
        info.push("⚠ 尝试从系统环境变量读取".to_string());
        return info;
    }
    match dotenv::from_path(&env_path) {
        Ok(()) => info.push(format!("✓ 读取 .env 文件: {}", env_path.display())),
        Err(e) => {
            info.push(format!("⚠ 无法读取 .env 文件: {}", e));
            info.push("⚠ 尝试从系统环境变量读取".to_string());
        }
    }
    info
}
