use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;

/// 判断远程文件是否存在
#[async_trait]
pub trait DocumentProbe: Send + Sync {
    async fn exists(&self, url: &str) -> bool;
}

/// 发一次 GET，2xx 视为存在；网络错误不向上抛
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentProbe for HttpProbe {
    async fn exists(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                info!("probe {} -> {}", url, resp.status());
                ok
            }
            Err(e) => {
                warn!("probe {} failed: {}", url, e);
                false
            }
        }
    }
}
