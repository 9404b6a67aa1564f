use crate::{
    error::{BadEnvVarSnafu, ParseEnvVarSnafu, RosterResult},
    import::ImportReconcile,
};
use snafu::{OptionExt, ResultExt};
use std::{env::VarError, str::FromStr};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 16 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfiguration {
    api_base: String,
    server_ip: String,
    reconcile: ImportReconcile,
    max_upload_bytes: usize,
    upload_chunk_bytes: usize,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        Self::from_lookup(|name| match dotenvy::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
            Err(e) => Err(e),
        })
    }

    ///`lookup` returns `Ok(None)` for variables that aren't set, which then take their defaults
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<Option<String>, dotenvy::Error>,
    ) -> RosterResult<Self> {
        let get = |name| lookup(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            api_base: get("ROSTER_API_BASE")?.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            server_ip: get("ROSTER_SERVER_IP")?.unwrap_or_else(|| DEFAULT_SERVER_IP.to_string()),
            reconcile: get("ROSTER_IMPORT_RECONCILE")?
                .map(|value| value.parse::<ImportReconcile>())
                .transpose()?
                .unwrap_or_default(),
            max_upload_bytes: parse_or(
                "ROSTER_MAX_UPLOAD_BYTES",
                get("ROSTER_MAX_UPLOAD_BYTES")?,
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            upload_chunk_bytes: parse_or(
                "ROSTER_UPLOAD_CHUNK_BYTES",
                get("ROSTER_UPLOAD_CHUNK_BYTES")?,
                DEFAULT_UPLOAD_CHUNK_BYTES,
            )?,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn reconcile(&self) -> ImportReconcile {
        self.reconcile
    }

    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub const fn upload_chunk_bytes(&self) -> usize {
        self.upload_chunk_bytes
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> RosterResult<T> {
    let Some(value) = value else {
        return Ok(default);
    };

    value
        .trim()
        .parse()
        .ok()
        .context(ParseEnvVarSnafu { name, value })
}
