use std::collections::HashMap;

pub type Translations = HashMap<String, String>;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Language codes with built-in translation tables.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "zh_CN"];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Translations for `code`, falling back to English.
pub fn translations(code: &str) -> Translations {
    match code {
        "zh_CN" => translations_zh_cn(),
        _ => translations_en(),
    }
}

fn translations_en() -> Translations {
    [
        // Navigation
        ("nav_home", "Home"),
        ("nav_gallery", "Gallery"),
        ("nav_previous", "Previous"),
        ("nav_next", "Next"),
        ("nav_close", "Close"),
        // Home page
        ("filter_all", "All"),
        ("view_grid", "Grid"),
        ("view_masonry", "Masonry"),
        ("action_view", "View"),
        // Placeholders
        ("placeholder_empty", "No works yet"),
        ("placeholder_failed", "Failed to load, please try again later."),
        ("exif_missing", "No EXIF Data"),
        // Lightbox
        ("action_toggle_info", "Show info"),
        ("action_zoom_in", "Zoom in"),
        ("action_zoom_out", "Zoom out"),
        // Login
        ("login_title", "Admin login"),
        ("login_password", "Password"),
        ("login_submit", "Log in"),
        ("login_failed", "Wrong password"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn translations_zh_cn() -> Translations {
    [
        // Navigation
        ("nav_home", "首页"),
        ("nav_gallery", "作品集"),
        ("nav_previous", "上一张"),
        ("nav_next", "下一张"),
        ("nav_close", "关闭"),
        // Home page
        ("filter_all", "全部"),
        ("view_grid", "网格"),
        ("view_masonry", "瀑布流"),
        ("action_view", "查看"),
        // Placeholders
        ("placeholder_empty", "暂无作品"),
        ("placeholder_failed", "加载作品失败，请稍后重试。"),
        ("exif_missing", "No EXIF Data"),
        // Lightbox
        ("action_toggle_info", "显示信息"),
        ("action_zoom_in", "放大"),
        ("action_zoom_out", "缩小"),
        // Login
        ("login_title", "管理员登录"),
        ("login_password", "密码"),
        ("login_submit", "登录"),
        ("login_failed", "密码错误"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
