use std::env;

const LOCALE_VARS: [&str; 4] = ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"];

/// Holds information about the current system environment
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os_info: String,
    pub locale: String,
}

impl SystemInfo {
    /// Detects the current system environment and returns a `SystemInfo` struct.
    pub fn new() -> Self {
        let os_info_val = os_info::get();
        let os_info = format!(
            "{} {} {}",
            os_info_val.os_type(),
            os_info_val.version(),
            os_info_val.bitness()
        );

        SystemInfo {
            os_info,
            locale: detect_locale(|key| env::var(key).ok()),
        }
    }
}

/// Picks the first non-empty locale variable and normalizes it to a BCP 47
/// style tag, `en-US` when nothing is set.
pub fn detect_locale<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    LOCALE_VARS
        .iter()
        .copied()
        .filter_map(&lookup)
        .map(|value| value.trim().to_string())
        // LANGUAGE is a colon-separated priority list
        .map(|value| value.split(':').next().unwrap_or_default().to_string())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .map(|value| normalize_locale(&value))
        .unwrap_or_else(|| "en-US".to_string())
}

/// `zh_CN.UTF-8` -> `zh-CN`, `de_DE@euro` -> `de-DE`
pub fn normalize_locale(raw: &str) -> String {
    let tag = raw.split(['.', '@']).next().unwrap_or(raw);
    let mut parts = tag.split(['_', '-']);
    let language = parts.next().unwrap_or_default().to_lowercase();
    match parts.next() {
        Some(region) if !region.is_empty() => format!("{}-{}", language, region.to_uppercase()),
        _ => language,
    }
}
