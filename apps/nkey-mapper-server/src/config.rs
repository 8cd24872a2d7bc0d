//! Server configuration.
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables prefixed with `NKEY_MAPPER__` (`__` separates nested keys, e.g.
//! `NKEY_MAPPER__AWS_IAM__VERIFIER__ENDPOINT`).

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{Context, ensure};
use aws_iam_verifier_plugin::AwsIamVerifierConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use kerberos_verifier_plugin::KerberosVerifierConfig;
use nkey_mapper::{MappingTableConfig, UserMappingConfig};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "NKEY_MAPPER__";
pub const DEFAULT_PORT: u16 = 8087;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub logging: LoggingConfig,
    /// Kerberos backend; absent means Kerberos requests are refused.
    pub kerberos: Option<KerberosBackendConfig>,
    /// AWS IAM backend; absent means AWS IAM requests are refused.
    pub aws_iam: Option<AwsIamBackendConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            logging: LoggingConfig::default(),
            kerberos: None,
            aws_iam: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KerberosBackendConfig {
    pub verifier: KerberosVerifierConfig,
    pub users: Vec<UserMappingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsIamBackendConfig {
    pub verifier: AwsIamVerifierConfig,
    pub users: Vec<UserMappingConfig>,
}

impl KerberosBackendConfig {
    #[must_use]
    pub fn mapping(&self) -> MappingTableConfig {
        MappingTableConfig {
            users: self.users.clone(),
        }
    }
}

impl AwsIamBackendConfig {
    #[must_use]
    pub fn mapping(&self) -> MappingTableConfig {
        MappingTableConfig {
            users: self.users.clone(),
        }
    }
}

impl ServerConfig {
    /// Number of provisioned identities across all backends.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.kerberos.as_ref().map_or(0, |k| k.users.len())
            + self.aws_iam.as_ref().map_or(0, |a| a.users.len())
    }
}

/// Layer the YAML file (if any) and the environment into a config.
pub fn load(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        ensure!(path.is_file(), "config file {} does not exist", path.display());
        figment = figment.merge(Yaml::file(path));
    }
    extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn extract(figment: Figment) -> anyhow::Result<ServerConfig> {
    figment
        .extract::<ServerConfig>()
        .context("invalid nkey-mapper configuration")
}
