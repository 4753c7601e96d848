use std::{net::IpAddr, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

pub const NOT_AVAILABLE: &str = "N/A";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("lookup answered with status {0}")]
    Status(reqwest::StatusCode),
}

/// Reverse lookup result. Missing fields render as `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct IpInfo {
    pub ip: String,
    pub city: String,
    pub country: String,
}

impl IpInfo {
    pub fn unavailable() -> Self {
        Self {
            ip: NOT_AVAILABLE.to_string(),
            city: NOT_AVAILABLE.to_string(),
            country: NOT_AVAILABLE.to_string(),
        }
    }
}

#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn lookup(&self, ip: Option<&str>) -> Result<IpInfo, GeolocationError>;
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    ip: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

/// ipinfo.io-compatible HTTP lookup, unauthenticated.
#[derive(Clone)]
pub struct HttpIpLookup {
    client: reqwest::Client,
    url_template: String,
}

impl HttpIpLookup {
    pub fn new(url_template: impl Into<String>) -> Result<Self, GeolocationError> {
        let client = reqwest::Client::builder().timeout(LOOKUP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    /// Only a well-formed address is substituted; anything else is treated
    /// as no address at all.
    pub fn url_for(&self, ip: Option<&str>) -> String {
        match ip.and_then(|ip| ip.trim().parse::<IpAddr>().ok()) {
            Some(ip) => self.url_template.replace("{ip}", &ip.to_string()),
            None => self.url_template.replace("/{ip}", "").replace("{ip}", ""),
        }
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    async fn lookup(&self, ip: Option<&str>) -> Result<IpInfo, GeolocationError> {
        let url = self.url_for(ip);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeolocationError::Status(response.status()));
        }
        let body = response.json::<IpInfoResponse>().await?;
        let field = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Ok(IpInfo {
            ip: field(body.ip),
            city: field(body.city),
            country: field(body.country),
        })
    }
}

/// Runs the lookup, degrading to placeholders on any failure.
pub async fn lookup_or_unavailable(lookup: &dyn IpLookup, ip: Option<&str>) -> IpInfo {
    match lookup.lookup(ip).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(error = %err, "ip lookup failed");
            IpInfo::unavailable()
        }
    }
}
