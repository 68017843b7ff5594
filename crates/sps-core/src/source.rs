//! Configuration document sources.
//!
//! The source is resolved once at process start, either from an explicit
//! URI or from the environment, and then passed to every run.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use tracing::{debug, error, info};

use crate::config::DashboardGroup;
use crate::error::{ConfigError, ConfigResult};

/// Enables the local-file source when set to any value.
pub const DEBUG_ENV: &str = "DEBUG";
/// Path of the local configuration file in debug mode.
pub const DEBUG_CONFIG_FILE_ENV: &str = "DEBUG_CONFIG_FILE";
/// Bucket holding the configuration object.
pub const S3_CONFIGURATION_BUCKET_ENV: &str = "S3_CONFIGURATION_BUCKET";
/// Key of the configuration object.
pub const S3_CONFIGURATION_OBJECT_KEY_ENV: &str = "S3_CONFIGURATION_OBJECT_KEY";

/// Where the configuration document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Local YAML file: file:///etc/sps/config.yaml or ./config.yaml
    LocalFile { path: PathBuf },
    /// Object store: s3://bucket/path/to/config.yaml
    ObjectStore { bucket: String, key: String },
}

impl ConfigSource {
    pub fn parse(uri: &str) -> ConfigResult<Self> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = rest
                .split_once('/')
                .filter(|(b, k)| !b.is_empty() && !k.is_empty())
                .ok_or_else(|| ConfigError::UnsupportedSource(uri.to_string()))?;
            Ok(ConfigSource::ObjectStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        } else if let Some(path) = uri.strip_prefix("file://") {
            Ok(ConfigSource::LocalFile { path: path.into() })
        } else if uri.contains("://") {
            Err(ConfigError::UnsupportedSource(uri.to_string()))
        } else {
            Ok(ConfigSource::LocalFile { path: uri.into() })
        }
    }

    /// Resolve the source from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the source through an arbitrary variable lookup.
    ///
    /// Debug mode selects the local file only when it exists; otherwise the
    /// object store variables are required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if lookup(DEBUG_ENV).is_some() {
            match lookup(DEBUG_CONFIG_FILE_ENV) {
                Some(path) if Path::new(&path).is_file() => {
                    info!(%path, "debug mode detected, using local configuration file");
                    return Ok(ConfigSource::LocalFile { path: path.into() });
                }
                path => {
                    error!(path = ?path, "debug mode could not find the configuration file");
                }
            }
        }

        let bucket = lookup(S3_CONFIGURATION_BUCKET_ENV)
            .ok_or(ConfigError::MissingEnv(S3_CONFIGURATION_BUCKET_ENV))?;
        let key = lookup(S3_CONFIGURATION_OBJECT_KEY_ENV)
            .ok_or(ConfigError::MissingEnv(S3_CONFIGURATION_OBJECT_KEY_ENV))?;
        Ok(ConfigSource::ObjectStore { bucket, key })
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            ConfigSource::LocalFile { .. } => "file",
            ConfigSource::ObjectStore { .. } => "s3",
        }
    }

    /// Fetch and parse the dashboard groups.
    pub async fn load(&self, store: &dyn ObjectStore) -> ConfigResult<Vec<DashboardGroup>> {
        match self {
            ConfigSource::LocalFile { path } => {
                info!(path = %path.display(), "loading configuration from file");
                let content =
                    tokio::fs::read_to_string(path)
                        .await
                        .map_err(|source| ConfigError::Io {
                            path: path.clone(),
                            source,
                        })?;
                parse_groups(&content)
            }
            ConfigSource::ObjectStore { bucket, key } => {
                info!(%bucket, "fetching configuration from object store");
                let response = store.get_object(bucket, key).await?;
                info!(status = response.status, "object store response");
                if response.status != 200 {
                    error!(%bucket, %key, status = response.status, "could not retrieve configuration");
                    return Err(ConfigError::Fetch {
                        bucket: bucket.clone(),
                        key: key.clone(),
                        status: response.status,
                    });
                }
                let content = std::str::from_utf8(&response.body)
                    .map_err(|e| ConfigError::Parse(e.to_string()))?;
                parse_groups(content)
            }
        }
    }
}

/// Parse a YAML configuration document into dashboard groups.
pub fn parse_groups(content: &str) -> ConfigResult<Vec<DashboardGroup>> {
    if content.trim().is_empty() {
        return Err(ConfigError::Empty);
    }
    let groups: Option<Vec<DashboardGroup>> =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    match groups {
        Some(groups) if !groups.is_empty() => {
            debug!(dashboards = groups.len(), "configuration parsed");
            Ok(groups)
        }
        _ => Err(ConfigError::Empty),
    }
}

// ── Object store ───────────────────────────────────────────────────

/// Raw object store response.
#[derive(Debug, Clone)]
pub struct ObjectResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Boxed future alias for object store fetches.
pub type ObjectFuture<'a> = Pin<Box<dyn Future<Output = ConfigResult<ObjectResponse>> + Send + 'a>>;

/// Object store access, injected so runs can be tested without a network.
pub trait ObjectStore: Send + Sync {
    /// Fetch a single object. Non-200 statuses are returned, not raised.
    fn get_object<'a>(&'a self, bucket: &'a str, key: &'a str) -> ObjectFuture<'a>;
}

/// Path-style HTTP object store client (`http://{address}/{bucket}/{key}`).
///
/// Speaks plain HTTP/1.1 to S3-compatible gateways.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    address: String,
}

impl HttpObjectStore {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    async fn fetch(&self, bucket: &str, key: &str) -> ConfigResult<ObjectResponse> {
        let uri = format!("http://{}/{bucket}/{key}", self.address);
        let request_err = |e: &dyn std::fmt::Display| ConfigError::ObjectStore(format!("{uri}: {e}"));

        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|e| request_err(&e))?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| request_err(&e))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", &self.address)
            .header("user-agent", "spsd/0.1")
            .body(Empty::<Bytes>::new())
            .map_err(|e| request_err(&e))?;

        let resp = sender.send_request(req).await.map_err(|e| request_err(&e))?;
        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| request_err(&e))?
            .to_bytes();
        debug!(%uri, status, bytes = body.len(), "object fetched");
        Ok(ObjectResponse { status, body })
    }
}

impl ObjectStore for HttpObjectStore {
    fn get_object<'a>(&'a self, bucket: &'a str, key: &'a str) -> ObjectFuture<'a> {
        Box::pin(self.fetch(bucket, key))
    }
}
