//! qBittorrent WebUI API v2 client.

use std::time::Duration;

use reqwest::header::{COOKIE, REFERER, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use seedsweep_core::{Torrent, TorrentId};

use crate::error::ClientError;
use crate::models::{TorrentFileInfo, TorrentInfo};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SESSION_COOKIE: &str = "SID";

/// Connection settings for a qBittorrent instance.
#[derive(Debug, Clone)]
pub struct QbitConfig {
    /// Host name, optionally with a scheme (`https://qbit.example`).
    pub host: String,
    /// Port, applied unless `host` already carries one.
    pub port: u16,
    /// WebUI user name.
    pub username: String,
    /// WebUI password.
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl QbitConfig {
    /// Create a config with the default timeout.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve the WebUI base URL.
    ///
    /// A host without scheme becomes `http://{host}:{port}/`.
    pub fn base_url(&self) -> Result<Url, ClientError> {
        let host = self.host.trim();
        let invalid = |message: String| ClientError::InvalidUrl {
            url: host.to_string(),
            message,
        };

        let mut url = if host.contains("://") {
            let mut url = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
            if url.port().is_none() {
                url.set_port(Some(self.port))
                    .map_err(|()| invalid("URL cannot carry a port".to_string()))?;
            }
            url
        } else {
            Url::parse(&format!("http://{host}:{}", self.port)).map_err(|e| invalid(e.to_string()))?
        };

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

/// Authenticated session against the qBittorrent WebUI.
#[derive(Debug, Clone)]
pub struct QbitClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
    sid: Option<String>,
}

impl QbitClient {
    /// Create a client. Call [`login`](Self::login) before anything else.
    pub fn new(config: &QbitConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ClientError::Build { source })?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
            username: config.username.clone(),
            password: config.password.clone(),
            sid: None,
        })
    }

    /// Get the resolved base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check whether a session cookie was obtained.
    pub fn has_session(&self) -> bool {
        self.sid.is_some()
    }

    /// Log in and keep the session cookie for later calls.
    ///
    /// Servers that bypass authentication for this address answer `Ok.`
    /// without a cookie; that is accepted.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        let endpoint = "auth/login";
        let response = self
            .request(Method::POST, endpoint)?
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|source| http_error(endpoint, source))?;

        match response.status() {
            StatusCode::FORBIDDEN => return Err(ClientError::Banned),
            status if !status.is_success() => {
                return Err(ClientError::Status {
                    endpoint: endpoint.to_string(),
                    status,
                });
            }
            _ => {}
        }

        let sid = session_cookie(&response);
        let body = response
            .text()
            .await
            .map_err(|source| decode_error(endpoint, source))?;

        if body.trim() != "Ok." {
            return Err(ClientError::LoginFailed);
        }

        debug!(session = sid.is_some(), "logged in to qBittorrent");
        self.sid = sid;
        Ok(())
    }

    /// Get the application version, e.g. `v4.6.2`.
    pub async fn app_version(&self) -> Result<String, ClientError> {
        let endpoint = "app/version";
        let response = self.send(self.request(Method::GET, endpoint)?, endpoint).await?;
        let version = response
            .text()
            .await
            .map_err(|source| decode_error(endpoint, source))?;
        Ok(version.trim().to_string())
    }

    /// List every torrent.
    pub async fn torrents(&self) -> Result<Vec<TorrentInfo>, ClientError> {
        let endpoint = "torrents/info";
        self.get_json(self.request(Method::GET, endpoint)?, endpoint)
            .await
    }

    /// List the files of one torrent.
    pub async fn torrent_files(&self, hash: &str) -> Result<Vec<TorrentFileInfo>, ClientError> {
        let endpoint = "torrents/files";
        let request = self
            .request(Method::GET, endpoint)?
            .query(&[("hash", hash)]);
        self.get_json(request, endpoint).await
    }

    /// List every torrent together with its files.
    ///
    /// A torrent whose file list cannot be fetched is returned without
    /// files; authentication failures abort.
    pub async fn inventory(&self) -> Result<Vec<Torrent>, ClientError> {
        let infos = self.torrents().await?;
        let mut torrents = Vec::with_capacity(infos.len());

        for info in infos {
            let files = match self.torrent_files(&info.hash).await {
                Ok(files) => files,
                Err(err) if err.is_auth() => return Err(err),
                Err(err) => {
                    warn!(torrent = %info.hash, error = %err, "failed to list torrent files");
                    Vec::new()
                }
            };
            torrents.push(info.into_torrent(files));
        }

        Ok(torrents)
    }

    /// Add `tag` to every torrent in `hashes`.
    pub async fn add_tags(&self, hashes: &[TorrentId], tag: &str) -> Result<(), ClientError> {
        if hashes.is_empty() {
            return Ok(());
        }

        let endpoint = "torrents/addTags";
        let joined = hashes
            .iter()
            .map(TorrentId::as_str)
            .collect::<Vec<_>>()
            .join("|");
        let request = self
            .request(Method::POST, endpoint)?
            .form(&[("hashes", joined.as_str()), ("tags", tag)]);

        self.send(request, endpoint).await?;
        Ok(())
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base_url
            .join("api/v2/")
            .and_then(|api| api.join(endpoint))
            .map_err(|e| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                message: e.to_string(),
            })?;

        let mut builder = self
            .http
            .request(method, url)
            .header(REFERER, self.base_url.as_str());
        if let Some(sid) = &self.sid {
            builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={sid}"));
        }
        Ok(builder)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| http_error(endpoint, source))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(ClientError::NotAuthenticated),
            status => Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ClientError> {
        self.send(request, endpoint)
            .await?
            .json()
            .await
            .map_err(|source| decode_error(endpoint, source))
    }
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
}

fn http_error(endpoint: &str, source: reqwest::Error) -> ClientError {
    ClientError::Http {
        endpoint: endpoint.to_string(),
        source,
    }
}

fn decode_error(endpoint: &str, source: reqwest::Error) -> ClientError {
    ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    }
}
