/// 基金日历后端接口路径
pub const PATH_GET_DATA: &str = "/getData";
pub const PATH_GET_USER_DATA: &str = "/getUserData";
pub const PATH_SAVE_USER_DATA: &str = "/saveUserData";
pub const PATH_SEND_TEST_EMAIL: &str = "/sendTestEmail";

/// WordPress 登录用户查询（相对于 WP API 根地址）
pub const PATH_WP_LOGIN_NAME: &str = "myplugin/v1/system-login-name";

pub fn url_get_data(base: &str) -> String {
    format!("{}{}", base, PATH_GET_DATA)
}

pub fn url_get_user_data(base: &str) -> String {
    format!("{}{}", base, PATH_GET_USER_DATA)
}

pub fn url_save_user_data(base: &str) -> String {
    format!("{}{}", base, PATH_SAVE_USER_DATA)
}

pub fn url_send_test_email(base: &str) -> String {
    format!("{}{}", base, PATH_SEND_TEST_EMAIL)
}

pub fn url_wp_login_name(wp_root: &str) -> String {
    if wp_root.ends_with('/') {
        format!("{}{}", wp_root, PATH_WP_LOGIN_NAME)
    } else {
        format!("{}/{}", wp_root, PATH_WP_LOGIN_NAME)
    }
}
