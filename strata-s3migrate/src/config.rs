//! Driver configuration.
//!
//! A driver is configured from a DSN:
//!
//! ```text
//! s3migrator://media-bucket?region=eu-west-1&endpoint=http://localhost:9090&path_style=true
//! ```
//!
//! or from the environment (`STRATA_S3_BUCKET`, `STRATA_S3_REGION`,
//! `STRATA_S3_ENDPOINT`, `STRATA_S3_PATH_STYLE`). Credentials come from the
//! standard AWS chain unless `access_key_id` and `secret_access_key` are given.

use url::Url;

use crate::env::{EnvSource, StdEnv};
use crate::error::{MigrateResult, MigrationError};
use crate::state::DRIVER_NAME;

/// Static credentials, for S3-compatible stores outside AWS.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token, for temporary credentials.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Where the migrated bucket lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3DriverConfig {
    /// Bucket to migrate.
    pub bucket: String,
    /// AWS region; the default chain decides when unset.
    pub region: Option<String>,
    /// Custom endpoint, such as a local S3 mock.
    pub endpoint: Option<String>,
    /// Address buckets by path instead of subdomain.
    pub path_style: bool,
    /// Credentials overriding the default chain.
    pub credentials: Option<StaticCredentials>,
}

impl S3DriverConfig {
    /// Configuration for `bucket` with every other setting defaulted.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint: None,
            path_style: false,
            credentials: None,
        }
    }

    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use path-style addressing.
    pub fn path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    /// Use static credentials.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(StaticCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        });
        self
    }

    /// The DSN naming `bucket`.
    pub fn dsn_for(bucket: &str) -> String {
        format!("{}://{}", DRIVER_NAME, bucket)
    }

    /// Parse a `s3migrator://<bucket>?...` DSN.
    pub fn from_dsn(dsn: &str) -> MigrateResult<Self> {
        let url = Url::parse(dsn).map_err(|e| MigrationError::invalid_dsn(dsn, e.to_string()))?;
        if url.scheme() != DRIVER_NAME {
            return Err(MigrationError::invalid_dsn(
                dsn,
                format!("scheme must be {}", DRIVER_NAME),
            ));
        }

        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| MigrationError::invalid_dsn(dsn, "missing bucket name"))?;
        let mut config = Self::new(bucket);

        let mut access_key_id = None;
        let mut secret_access_key = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "region" => config.region = Some(value.into_owned()),
                "endpoint" => config.endpoint = Some(value.into_owned()),
                "path_style" => {
                    config.path_style = parse_bool(&value)
                        .ok_or_else(|| MigrationError::invalid_dsn(dsn, "path_style must be a boolean"))?
                }
                "access_key_id" => access_key_id = Some(value.into_owned()),
                "secret_access_key" => secret_access_key = Some(value.into_owned()),
                other => {
                    return Err(MigrationError::invalid_dsn(
                        dsn,
                        format!("unknown option '{}'", other),
                    ));
                }
            }
        }

        config.credentials = match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: None,
            }),
            (None, None) => None,
            _ => {
                return Err(MigrationError::invalid_dsn(
                    dsn,
                    "access_key_id and secret_access_key go together",
                ));
            }
        };

        Ok(config)
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> MigrateResult<Self> {
        Self::from_env_source(&StdEnv)
    }

    /// Read the configuration from `env`.
    pub fn from_env_source(env: &dyn EnvSource) -> MigrateResult<Self> {
        let bucket = env
            .get("STRATA_S3_BUCKET")
            .filter(|b| !b.is_empty())
            .ok_or_else(|| MigrationError::config("STRATA_S3_BUCKET is not set"))?;

        let mut config = Self::new(bucket);
        config.region = env.get("STRATA_S3_REGION").filter(|v| !v.is_empty());
        config.endpoint = env.get("STRATA_S3_ENDPOINT").filter(|v| !v.is_empty());
        if let Some(flag) = env.get("STRATA_S3_PATH_STYLE") {
            config.path_style = parse_bool(&flag).ok_or_else(|| {
                MigrationError::config(format!("STRATA_S3_PATH_STYLE: invalid boolean '{}'", flag))
            })?;
        }
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
