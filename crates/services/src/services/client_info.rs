use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const UNKNOWN_BROWSER: &str = "Navigateur inconnu";
pub const UNKNOWN_OS: &str = "OS inconnu";

/// Raw client hint headers (`sec-ch-ua*`) as sent by Chromium browsers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ClientHints {
    pub brands: Option<String>,
    pub full_version_list: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ClientInfo {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os: Option<String>,
}

impl ClientInfo {
    pub fn browser_label(&self) -> String {
        match &self.browser_name {
            Some(name) => format!("{} {}", name, self.browser_version.as_deref().unwrap_or(""))
                .trim()
                .to_string(),
            None => UNKNOWN_BROWSER.to_string(),
        }
    }

    pub fn os_label(&self) -> String {
        self.os.clone().unwrap_or_else(|| UNKNOWN_OS.to_string())
    }
}

static BRAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"\s*;\s*v\s*=\s*"([^"]*)""#).expect("valid regex")
});

// Order matters: iOS UAs say "like Mac OS X", Android UAs say linux.
static OS_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Windows 10/11", r"windows nt 10"),
        ("Windows 8.1", r"windows nt 6\.3"),
        ("Windows 7", r"windows nt 6\.1"),
        ("iOS", r"iphone|ipad|ipod"),
        ("macOS", r"mac os x"),
        ("Android", r"android"),
        ("Linux", r"linux"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

// Order matters: Edge and Opera also advertise chrome/, Chrome also advertises safari.
static BROWSER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Edge", r"edg/([\d.]+)"),
        ("Opera", r"opr/([\d.]+)"),
        ("Chrome", r"chrome/([\d.]+)"),
        ("Firefox", r"firefox/([\d.]+)"),
        ("Safari", r"version/([\d.]+).*safari"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

fn parse_brand_list(header: &str) -> Vec<(String, String)> {
    BRAND
        .captures_iter(header)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Identifies browser and OS, preferring client hints and falling back to
/// user-agent heuristics when any piece is still missing.
pub fn parse_client(user_agent: Option<&str>, hints: &ClientHints) -> ClientInfo {
    let mut info = ClientInfo {
        browser_name: None,
        browser_version: None,
        os: None,
    };

    if let Some(brands_header) = non_empty(hints.brands.as_deref()) {
        let brands = parse_brand_list(brands_header);
        let main = brands
            .iter()
            .find(|(brand, _)| !brand.contains("Not") && !brand.contains("Chromium"))
            .or_else(|| brands.last());
        info.browser_name = main.map(|(brand, _)| brand.clone());

        if let (Some(name), Some(list)) = (
            info.browser_name.as_deref(),
            non_empty(hints.full_version_list.as_deref()),
        ) {
            info.browser_version = parse_brand_list(list)
                .into_iter()
                .find(|(brand, _)| brand == name)
                .map(|(_, version)| version);
        }

        info.os = non_empty(hints.platform.as_deref())
            .map(|platform| platform.trim_matches('"').to_string())
            .filter(|platform| !platform.is_empty());
    }

    if info.browser_name.is_none() || info.browser_version.is_none() || info.os.is_none() {
        let ua = user_agent.unwrap_or_default().to_lowercase();

        if let Some((name, _)) = OS_PATTERNS.iter().find(|(_, re)| re.is_match(&ua)) {
            info.os = Some((*name).to_string());
        }

        for (name, re) in BROWSER_PATTERNS.iter() {
            if let Some(caps) = re.captures(&ua) {
                info.browser_name = Some((*name).to_string());
                info.browser_version = caps.get(1).map(|m| m.as_str().to_string());
                break;
            }
        }
    }

    info
}
