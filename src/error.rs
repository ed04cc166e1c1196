use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum DeskError {
    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("未找到: {0}")]
    NotFound(String),
    #[error("配置错误: {0}")]
    Config(String),
}

pub type DeskResult<T> = Result<T, DeskError>;

impl DeskError {
    /// 从失败响应体中提取 `detail` 字段，没有时使用默认提示
    pub fn from_status(status: StatusCode, body: &str, fallback: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .and_then(|d| d.as_str())
                    .map(|s| s.to_string())
            })
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        DeskError::Status { status, detail }
    }

    /// 面向界面的提示文本
    pub fn user_message(&self) -> String {
        match self {
            DeskError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
