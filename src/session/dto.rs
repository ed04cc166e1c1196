use crate::catalog::model::null_as_default;
use crate::funds::EmailDateEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDataRequest<'a> {
    pub selected_funds: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

/// 用户偏好，后端原样保存；未知字段保留在 `extra` 中回传
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub selected_funds: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub selected_funds_for_mail: Vec<String>,
    pub number_of_days_ahead: Option<u8>,
    #[serde(deserialize_with = "null_as_default")]
    pub email_dates: HashMap<String, Vec<EmailDateEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct WpLoginResponse {
    pub user_email: Option<String>,
}
