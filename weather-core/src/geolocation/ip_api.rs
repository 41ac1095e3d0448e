use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{error::LookupError, http::fetch_json};

use super::{Coordinates, IpLocator};

pub const IP_GEOLOCATION_URL: &str = "http://ip-api.com/json/";

/// Approximate position of the caller's public IP via ip-api.com.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    http: Client,
    url: String,
}

impl IpApiLocator {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[derive(Debug, Serialize)]
struct IpQuery<'a> {
    fields: &'a str,
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    status: String,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpResponse {
    fn coordinates(&self) -> Option<Coordinates> {
        if self.status != "success" {
            return None;
        }
        Some(Coordinates { latitude: self.lat?, longitude: self.lon? })
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<Coordinates, LookupError> {
        let query = IpQuery { fields: "status,city,lat,lon" };
        let parsed: IpResponse =
            fetch_json(self.http.get(&self.url).query(&query), "ip geolocation").await?;

        let coordinates = parsed.coordinates().ok_or_else(|| {
            LookupError::InvalidResponse(format!(
                "ip geolocation returned no usable coordinates (status: {})",
                parsed.status
            ))
        })?;

        tracing::debug!(city = ?parsed.city, "located via IP");
        Ok(coordinates)
    }
}
