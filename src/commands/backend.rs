use crate::app_state::AppEvent;
use crate::session::{BackendSession, UserData};
use crate::storage::repository::{PreferenceKey, PreferenceRepository};
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 防抖拉取基金数据
///
/// 等待 `debounce` 后请求一次；调用方在新的选择到来时 abort 旧任务，
/// 已经发出的旧结果由界面按 generation 丢弃。
pub fn spawn_fund_fetch(
    session: Arc<BackendSession>,
    funds: Vec<String>,
    generation: u64,
    debounce: Duration,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(debounce).await;
        if funds.is_empty() {
            let _ = evt_tx.send(AppEvent::Funds {
                generation,
                result: Ok(Vec::new()),
            });
            return;
        }
        info!("拉取基金数据 (gen={}): {:?}", generation, funds);
        let result = session
            .get_data(&funds)
            .await
            .map_err(|e| {
                warn!("基金数据拉取失败 (gen={}): {}", generation, e);
                e.user_message()
            });
        let _ = evt_tx.send(AppEvent::Funds { generation, result });
    })
}

pub async fn load_user_data(
    session: &BackendSession,
    email: &str,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    let _ = evt_tx.send(AppEvent::Log(format!("正在读取 {} 的设置...", email)));
    match session.get_user_data(email).await {
        Ok(data) => {
            let _ = evt_tx.send(AppEvent::UserData(Box::new(data)));
        }
        Err(e) => {
            error!("读取用户设置失败: {}", e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 读取设置失败: {}", e.user_message())));
        }
    }
}

/// 保存到后端，并在本地留一份
pub async fn save_user_data(
    session: &BackendSession,
    db: &Arc<DatabaseConnection>,
    data: &UserData,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    if let Err(e) = PreferenceRepository::set_json(db, PreferenceKey::EmailSettings, data).await {
        warn!("本地保存邮件设置失败: {}", e);
    }
    match session.save_user_data(data).await {
        Ok(_) => {
            let _ = evt_tx.send(AppEvent::Message(format!("✓ 设置已保存 ({})", data.email)));
        }
        Err(e) => {
            error!("保存用户设置失败: {}", e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 保存失败: {}", e.user_message())));
        }
    }
}

pub async fn send_test_email(
    session: &BackendSession,
    email: &str,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    match session.send_test_email(email).await {
        Ok(_) => {
            let _ = evt_tx.send(AppEvent::Message(format!("✓ 测试邮件已发送至 {}", email)));
        }
        Err(e) => {
            error!("发送测试邮件失败: {}", e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ 测试邮件发送失败: {}", e.user_message())));
        }
    }
}

/// 启动时查询 WordPress 登录用户
pub async fn fetch_login_email(
    session: &BackendSession,
    wp_root: &str,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    match session.fetch_login_email(wp_root).await {
        Ok(Some(email)) => {
            info!("WordPress 登录用户: {}", email);
            let _ = evt_tx.send(AppEvent::LoginEmail(email));
        }
        Ok(None) => {
            let _ = evt_tx.send(AppEvent::Log("⚠ WordPress 未返回登录邮箱".to_string()));
        }
        Err(e) => {
            warn!("查询登录用户失败: {}", e);
            let _ = evt_tx.send(AppEvent::Log(format!("⚠ 查询登录用户失败: {}", e.user_message())));
        }
    }
}
