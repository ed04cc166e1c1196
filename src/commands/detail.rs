use crate::app_state::AppEvent;
use crate::catalog::CatalogAssets;
use log::{error, info};
use tokio::sync::mpsc;

pub async fn product(assets: &CatalogAssets, code: &str, evt_tx: mpsc::UnboundedSender<AppEvent>) {
    let _ = evt_tx.send(AppEvent::Log(format!("正在加载产品详情: {}...", code)));
    match assets.product_detail(code).await {
        Ok(detail) => {
            info!("产品详情已加载: {} ({} 个文件)", code, detail.files.len());
            let _ = evt_tx.send(AppEvent::ProductDetail {
                code: code.to_string(),
                detail: Box::new(detail),
            });
        }
        Err(e) => {
            error!("加载产品详情失败 {}: {}", code, e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 产品详情加载失败: {}", e.user_message())));
        }
    }
}

pub async fn company(assets: &CatalogAssets, code: &str, evt_tx: mpsc::UnboundedSender<AppEvent>) {
    let _ = evt_tx.send(AppEvent::Log(format!("正在加载公司详情: {}...", code)));
    match assets.company_detail(code).await {
        Ok(detail) => {
            info!(
                "公司详情已加载: {} ({} 条资讯)",
                code,
                detail.information.len()
            );
            let _ = evt_tx.send(AppEvent::CompanyDetail {
                code: code.to_string(),
                detail: Box::new(detail),
            });
        }
        Err(e) => {
            error!("加载公司详情失败 {}: {}", code, e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 公司详情加载失败: {}", e.user_message())));
        }
    }
}

pub async fn information(assets: &CatalogAssets, id: &str, evt_tx: mpsc::UnboundedSender<AppEvent>) {
    match assets.information(id).await {
        Ok(info) => {
            let _ = evt_tx.send(AppEvent::Information(Box::new(info)));
        }
        Err(e) => {
            error!("加载资讯失败 {}: {}", id, e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 资讯加载失败: {}", e.user_message())));
        }
    }
}
