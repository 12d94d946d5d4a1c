use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::{debug, trace, warn};

use crate::brand::Brand;
use crate::logger::MessageLogger;
use crate::protocol::{self, ApiResponse};
use crate::thermostat::Thermostat;
use crate::{Error, Result};

pub struct NuHeatBuilder {
    username: String,
    password: String,
    brand: Brand,
    session_id: Option<String>,
    api_url: Option<String>,
    timeout: Option<Duration>,
    log_path: Option<PathBuf>,
}

impl NuHeatBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            brand: Brand::default(),
            session_id: None,
            api_url: None,
            timeout: None,
            log_path: None,
        }
    }

    pub fn brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self
    }

    /// Reuse a session id from an earlier login instead of authenticating.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Send requests to `url` instead of the brand's API root. Headers still
    /// name the brand's host.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn message_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<NuHeat> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        let logger = match self.log_path {
            Some(path) => Some(Mutex::new(MessageLogger::new(&path)?)),
            None => None,
        };

        let api_url = self
            .api_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.brand.api_url());

        Ok(NuHeat {
            http,
            username: self.username,
            password: self.password,
            brand: self.brand,
            api_url,
            session_id: Mutex::new(self.session_id.filter(|id| !id.is_empty())),
            logger,
        })
    }
}

/// An API session: credentials, brand, and the session id shared by every
/// thermostat handle created from it.
pub struct NuHeat {
    http: reqwest::Client,
    username: String,
    password: String,
    brand: Brand,
    api_url: String,
    session_id: Mutex<Option<String>>,
    logger: Option<Mutex<MessageLogger>>,
}

impl fmt::Debug for NuHeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NuHeat")
            .field("username", &self.username)
            .field("brand", &self.brand)
            .finish_non_exhaustive()
    }
}

impl NuHeat {
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> NuHeatBuilder {
        NuHeatBuilder::new(username, password)
    }

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        NuHeatBuilder::new(username, password).build()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth_url(&self) -> String {
        format!("{}/authenticate/user", self.api_url)
    }

    pub fn thermostat_url(&self) -> String {
        format!("{}/thermostat", self.api_url)
    }

    pub fn session_id(&self) -> Option<String> {
        self.token().clone()
    }

    /// Log in unless a session id is already held.
    pub async fn authenticate(&self) -> Result<()> {
        if self.token().is_some() {
            debug!("using existing session");
            return Ok(());
        }

        debug!(brand = self.brand.as_name(), "creating session");
        let url = self.auth_url();
        let form = protocol::auth_form(&self.username, &self.password);
        let resp = self.dispatch(&url, Method::POST, Some(&form), &[]).await?;
        let body = self.read_body(resp.error_for_status()?).await?;

        let session_id = protocol::session_id(&body).ok_or(Error::Authentication)?;
        *self.token() = Some(session_id);
        Ok(())
    }

    pub async fn thermostat(&self, serial_number: impl Into<String>) -> Result<Thermostat<'_>> {
        Thermostat::new(self, serial_number.into()).await
    }

    /// Send a request with the brand headers and the session id, if held.
    ///
    /// A 401 with `allow_retry` set drops the session id, logs in again and
    /// repeats the request once. A second 401 is returned as an HTTP error.
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        data: Option<&[(&str, String)]>,
        params: &[(&str, String)],
        allow_retry: bool,
    ) -> Result<ApiResponse> {
        let mut allow_retry = allow_retry;
        loop {
            let resp = self.dispatch(url, method.clone(), data, params).await?;
            let status = resp.status();

            if status == StatusCode::UNAUTHORIZED && allow_retry {
                warn!(url = %url, "request unauthorized, re-authenticating");
                self.log(|l| l.log_reauth(url));
                allow_retry = false;
                *self.token() = None;
                self.authenticate().await?;
                continue;
            }

            if !status.is_success() {
                self.log(|l| l.log_response(status.as_u16(), ""));
            }
            return self.read_body(resp.error_for_status()?).await;
        }
    }

    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        self.request(url, Method::GET, None, params, true).await
    }

    pub async fn post(
        &self,
        url: &str,
        data: &[(&str, String)],
        params: &[(&str, String)],
    ) -> Result<ApiResponse> {
        self.request(url, Method::POST, Some(data), params, true).await
    }

    async fn dispatch(
        &self,
        url: &str,
        method: Method,
        data: Option<&[(&str, String)]>,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let mut query = params.to_vec();
        if let Some(session_id) = self.session_id() {
            query.push(("sessionid", session_id));
        }

        debug!(url = %url, method = %method, "sending request");
        self.log(|l| l.log_request(method.as_str(), url, &query, data));

        let mut req = self
            .http
            .request(method, url)
            .headers(self.brand.request_headers())
            .query(&query);
        if let Some(data) = data {
            req = req.form(data);
        }
        Ok(req.send().await?)
    }

    async fn read_body(&self, resp: reqwest::Response) -> Result<ApiResponse> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        self.log(|l| l.log_response(status, &body));

        match serde_json::from_str(&body) {
            Ok(value) => Ok(ApiResponse::Json(value)),
            Err(_) => {
                trace!(status, "response body is not JSON");
                Ok(ApiResponse::Raw { status, body })
            }
        }
    }

    fn token(&self) -> MutexGuard<'_, Option<String>> {
        self.session_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger {
            f(&mut logger.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}
