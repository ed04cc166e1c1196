use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP 会话
///
/// 持有共享的 Client，并在每个请求上附加固定的请求头（如 `X-WP-Nonce`）。
/// 每个请求只发送一次，不做重试，失败由调用方处理。
pub struct HttpSession {
    client: Client,
    default_headers: HashMap<String, String>,
}

impl HttpSession {
    /// 创建一个新的 HttpSession
    ///
    /// # 参数
    ///
    /// * `timeout` - 单个请求的超时时间
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent("agentdesk/0.1")
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            default_headers: HashMap::new(),
        }
    }

    /// 设置附加请求头
    pub fn set_default_headers(&mut self, headers: HashMap<String, String>) {
        self.default_headers = headers;
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// 执行 HTTP 请求
    ///
    /// # 参数
    ///
    /// * `builder` - 一个闭包，接收 Client 并返回 RequestBuilder
    pub async fn request<F>(&self, builder: F) -> Result<Response, reqwest::Error>
    where
        F: FnOnce(&Client) -> RequestBuilder,
    {
        let mut request = builder(&self.client);
        for (key, value) in &self.default_headers {
            request = request.header(key, value);
        }
        match request.send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    info!("{} request(...) [{}]", self, resp.status());
                } else {
                    warn!("{} request(...) [{}] {}", self, resp.status(), resp.url());
                }
                Ok(resp)
            }
            Err(e) => {
                warn!("{} request(...) failed: {}", self, e);
                Err(e)
            }
        }
    }

    /// GET 请求
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.request(|client| client.get(url)).await
    }

    /// POST JSON 请求
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        self.request(|client| client.post(url).json(body)).await
    }
}

impl std::fmt::Display for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<HttpSession [{} headers]>", self.default_headers.len())
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<HttpSession [{} headers]>", self.default_headers.len())
    }
}
