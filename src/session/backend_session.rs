use super::dto::{EmailRequest, GetDataRequest, UserData, WpLoginResponse};
use super::http_session::HttpSession;
use super::urls::*;
use crate::error::{DeskError, DeskResult};
use crate::funds::Fund;
use log::info;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// 基金日历后端的会话
///
/// 包装 HttpSession，提供 getData / getUserData / saveUserData / sendTestEmail。
pub struct BackendSession {
    session: HttpSession,
    base_url: String,
}

impl BackendSession {
    pub fn new(session: HttpSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into(),
        }
    }

    /// 设置 WordPress nonce，随每个请求发送
    pub fn set_wp_nonce(&mut self, nonce: &str) {
        let mut headers = HashMap::new();
        headers.insert("X-WP-Nonce".to_string(), nonce.to_string());
        self.session.set_default_headers(headers);
    }

    /// 获取所选基金的发行日历
    pub async fn get_data(&self, selected_funds: &[String]) -> DeskResult<Vec<Fund>> {
        let url = url_get_data(&self.base_url);
        let resp = self
            .session
            .post_json(&url, &GetDataRequest { selected_funds })
            .await?;
        info!("{} get_data(...) [{}]", self, url);
        read_json(resp, "Failed to fetch fund data").await
    }

    /// 读取用户偏好
    pub async fn get_user_data(&self, email: &str) -> DeskResult<UserData> {
        let url = url_get_user_data(&self.base_url);
        let resp = self.session.post_json(&url, &EmailRequest { email }).await?;
        info!("{} get_user_data(...) [{}]", self, url);
        read_json(resp, "Failed to fetch user data").await
    }

    /// 保存用户偏好，返回值原样透传
    pub async fn save_user_data(&self, data: &UserData) -> DeskResult<Value> {
        let url = url_save_user_data(&self.base_url);
        let resp = self.session.post_json(&url, data).await?;
        info!("{} save_user_data(...) [{}]", self, url);
        read_json(resp, "Failed to save user data").await
    }

    /// 发送测试邮件
    pub async fn send_test_email(&self, email: &str) -> DeskResult<Value> {
        let url = url_send_test_email(&self.base_url);
        let resp = self.session.post_json(&url, &EmailRequest { email }).await?;
        info!("{} send_test_email(...) [{}]", self, url);
        read_json(resp, "Failed to send test email").await
    }

    /// 从 WordPress 查询当前登录用户的邮箱
    pub async fn fetch_login_email(&self, wp_root: &str) -> DeskResult<Option<String>> {
        let url = url_wp_login_name(wp_root);
        let resp = self.session.get(&url).await?;
        info!("{} fetch_login_email(...) [{}]", self, url);
        let body: WpLoginResponse = read_json(resp, "Failed to fetch user email").await?;
        Ok(body.user_email.filter(|e| !e.trim().is_empty()))
    }
}

/// 非 2xx 时优先使用响应体里的 `detail`
async fn read_json<T: DeserializeOwned>(resp: Response, fallback: &str) -> DeskResult<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(DeskError::from_status(status, &body, fallback));
    }
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(&body)?)
}

impl std::fmt::Display for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<BackendSession [{}]>", self.base_url)
    }
}

impl std::fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<BackendSession [{}]>", self.base_url)
    }
}
