use super::model::{
    CatalogList, Company, CompanyDetail, InformationDetail, Product, ProductDetail,
};
use crate::error::{DeskError, DeskResult};
use log::{info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

pub const PRODUCT_LIST_PATH: &str = "pages/all_product_table_data.json";
pub const COMPANY_LIST_PATH: &str = "company_pages/all_company_table_data.json";

/// 代码中的冒号替换为下划线作为文件名，如 "AIA:2I1OLP" -> "AIA_2I1OLP"
pub fn code_to_file_stem(code: &str) -> String {
    code.replacen(':', "_", 1)
}

pub fn product_detail_path(product_code: &str) -> String {
    format!("products/{}_detail.json", code_to_file_stem(product_code))
}

pub fn company_detail_path(company_code: &str) -> String {
    format!("company/{}.json", company_code)
}

pub fn information_path(info_id: &str) -> String {
    format!("infomations/{}.json", info_id)
}

/// 静态 JSON 资源的来源：本地目录或 HTTP 根地址
#[derive(Debug, Clone)]
pub enum AssetSource {
    Dir(PathBuf),
    Http { client: Client, base_url: String },
}

impl AssetSource {
    /// 含 "://" 视为 HTTP 地址，否则当作本地目录
    pub fn from_root(root: &str, client: Client) -> Self {
        if root.contains("://") {
            AssetSource::Http {
                client,
                base_url: root.trim_end_matches('/').to_string(),
            }
        } else {
            AssetSource::Dir(PathBuf::from(root))
        }
    }

    pub async fn fetch_text(&self, rel_path: &str) -> DeskResult<String> {
        match self {
            AssetSource::Dir(root) => {
                let path = root.join(rel_path);
                match tokio::fs::read_to_string(&path).await {
                    Ok(s) => Ok(s),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(DeskError::NotFound(path.display().to_string()))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            AssetSource::Http { client, base_url } => {
                let url = format!("{}/{}", base_url, rel_path);
                let resp = client.get(&url).send().await?;
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(DeskError::NotFound(url));
                }
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(DeskError::from_status(status, &body, "资源加载失败"));
                }
                info!("asset fetched [{}]", url);
                Ok(resp.text().await?)
            }
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, rel_path: &str) -> DeskResult<T> {
        let text = self.fetch_text(rel_path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 详情文件可能包在 `data` 里，也可能直接是对象
    pub async fn fetch_wrapped<T: DeserializeOwned>(&self, rel_path: &str) -> DeskResult<T> {
        let v: Value = self.fetch_json(rel_path).await?;
        Ok(unwrap_data(v)?)
    }
}

fn unwrap_data<T: DeserializeOwned>(mut v: Value) -> Result<T, serde_json::Error> {
    match v.get_mut("data") {
        Some(inner) if inner.is_object() => serde_json::from_value(inner.take()),
        _ => serde_json::from_value(v),
    }
}

/// 目录数据加载器
#[derive(Debug, Clone)]
pub struct CatalogAssets {
    source: AssetSource,
}

impl CatalogAssets {
    pub fn new(source: AssetSource) -> Self {
        Self { source }
    }

    pub async fn load_products(&self) -> DeskResult<Vec<Product>> {
        let list: CatalogList<Product> = self.source.fetch_json(PRODUCT_LIST_PATH).await?;
        info!("产品目录已加载: {} 条", list.list.len());
        Ok(list.list)
    }

    pub async fn load_companies(&self) -> DeskResult<Vec<Company>> {
        let list: CatalogList<Company> = self.source.fetch_json(COMPANY_LIST_PATH).await?;
        info!("公司目录已加载: {} 条", list.list.len());
        Ok(list.list)
    }

    pub async fn product_detail(&self, product_code: &str) -> DeskResult<ProductDetail> {
        self.source
            .fetch_wrapped(&product_detail_path(product_code))
            .await
            .map_err(|e| not_found_as(e, format!("产品详情不存在: {}", product_code)))
    }

    pub async fn company_detail(&self, company_code: &str) -> DeskResult<CompanyDetail> {
        self.source
            .fetch_wrapped(&company_detail_path(company_code))
            .await
            .map_err(|e| not_found_as(e, format!("公司详情不存在: {}", company_code)))
    }

    pub async fn information(&self, info_id: &str) -> DeskResult<InformationDetail> {
        self.source
            .fetch_wrapped(&information_path(info_id))
            .await
            .map_err(|e| not_found_as(e, format!("资讯不存在: {}", info_id)))
    }
}

fn not_found_as(err: DeskError, msg: String) -> DeskError {
    match err {
        DeskError::NotFound(path) => {
            warn!("asset missing: {}", path);
            DeskError::NotFound(msg)
        }
        other => other,
    }
}
