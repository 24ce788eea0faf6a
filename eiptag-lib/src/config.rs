use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{ClientError, Result};

/// Connection options for one PLC target
#[derive(Debug, Deserialize, Clone)]
pub struct Options {
    /// PLC host, either an IP/hostname (port 44818 implied) or `host:port`
    pub ip: String,
    /// Backplane route path string, e.g. "1,0" or "0x01;0x00"
    /// Default: backplane port 1, slot 0
    #[serde(default)]
    pub path: Option<String>,
    /// Per-operation timeout in milliseconds
    /// Default: 5000
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Options {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            path: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Load options from a TOML file.
    pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Options> {
        let txt = fs::read_to_string(p)
            .map_err(|e| ClientError::Config(format!("failed to read options file: {e}")))?;
        let opts: Options = toml::from_str(&txt)
            .map_err(|e| ClientError::Config(format!("failed to parse options: {e}")))?;
        if opts.ip.is_empty() {
            return Err(ClientError::Config("ip must not be empty".to_string()));
        }
        Ok(opts)
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Port/link bytes that steer a CIP service through the PLC backplane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath(Vec<u8>);

impl RoutePath {
    /// Parse a route string: tokens separated by `,` or `;`, each a decimal
    /// 0-255 or a `0x`-prefixed hex byte. Empty or malformed input falls
    /// back to the backplane default `[1, 0]` with a warning.
    pub fn parse(raw: Option<&str>) -> RoutePath {
        let Some(raw) = raw else {
            return RoutePath::default();
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RoutePath::default();
        }
        let mut bytes = Vec::new();
        for tok in trimmed.split([',', ';']) {
            let tok = tok.trim();
            let parsed = match tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
                Some(hex) => u8::from_str_radix(hex, 16).ok(),
                None => tok.parse::<u8>().ok(),
            };
            match parsed {
                Some(b) => bytes.push(b),
                None => {
                    warn!(route = %raw, token = %tok, "malformed route path, using backplane default");
                    return RoutePath::default();
                }
            }
        }
        RoutePath(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        RoutePath(vec![1, 0])
    }
}
