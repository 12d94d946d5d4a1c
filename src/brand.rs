use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, DNT, HOST, ORIGIN};

/// Vendor deployment sharing the same API shape under a different hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Brand {
    #[default]
    NuHeat,
    MapeHeat,
    WarmTiles,
}

impl Brand {
    /// Total lookup: unknown names fall back to the default brand.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "NUHEAT" => Brand::NuHeat,
            "MAPEHEAT" => Brand::MapeHeat,
            "WARMTILES" => Brand::WarmTiles,
            _ => Brand::default(),
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Brand::NuHeat => "NUHEAT",
            Brand::MapeHeat => "MAPEHEAT",
            Brand::WarmTiles => "WARMTILES",
        }
    }

    pub fn hostname(&self) -> &'static str {
        match self {
            Brand::NuHeat => "mynuheat.com",
            Brand::MapeHeat => "mymapeheat.com",
            Brand::WarmTiles => "warmtiles.mythermostat.info",
        }
    }

    pub fn api_url(&self) -> String {
        format!("https://{}/api", self.hostname())
    }

    pub fn auth_url(&self) -> String {
        format!("{}/authenticate/user", self.api_url())
    }

    pub fn thermostat_url(&self) -> String {
        format!("{}/thermostat", self.api_url())
    }

    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HOST, HeaderValue::from_static(self.hostname()));
        headers.insert(DNT, HeaderValue::from_static("1"));
        if let Ok(origin) = HeaderValue::from_str(&self.api_url()) {
            headers.insert(ORIGIN, origin);
        }
        headers
    }
}
