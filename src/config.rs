use std::{
    env,
    fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use ipc_client::DEFAULT_CLI_PATH;
use serde::{Deserialize, Serialize};

/// Largest file accepted by the multipart upload route.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const DEFAULT_PORT: &str = "3000";

/// Environment variables read on top of the config file.
const ENV_KEYS: &[&str] = &[
    "LISTEN_ADDR",
    "AKAVECLI_PATH",
    "NODE_ADDRESS",
    "PRIVATE_KEY",
    "CORS_ORIGIN",
    "DOWNLOAD_DIR",
    "MAX_UPLOAD_BYTES",
    "STRUCTURED_LOGGING",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    // Enable tracing.
    #[serde(default)]
    pub enable_tracing: bool,
    // OpenTelemetry collector grpc endpoint. Defaults to the exporter's own default.
    pub endpoint: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub env: String,
    pub listen_addr: String,
    pub cli_path: PathBuf,
    pub node_address: Option<String>,
    pub private_key: Option<String>,
    pub cors_origin: String,
    pub download_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub structured_logging: bool,
    pub telemetry: TelemetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let download_dir = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("downloads");
        GatewayConfig {
            env: "local".to_string(),
            listen_addr: format!("0.0.0.0:{}", port),
            cli_path: PathBuf::from(DEFAULT_CLI_PATH),
            node_address: None,
            private_key: None,
            cors_origin: "*".to_string(),
            download_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            structured_logging: false,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("env", &self.env)
            .field("listen_addr", &self.listen_addr)
            .field("cli_path", &self.cli_path)
            .field("node_address", &self.node_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("cors_origin", &self.cors_origin)
            .field("download_dir", &self.download_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("structured_logging", &self.structured_logging)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl GatewayConfig {
    /// Defaults, then the optional YAML file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<GatewayConfig> {
        let mut figment = Figment::from(Serialized::defaults(GatewayConfig::default()));
        if let Some(path) = path {
            let config_str = std::fs::read_to_string(path)?;
            figment = figment.merge(Yaml::string(&config_str));
        }
        Self::from_figment(figment.merge(env_provider()))
    }

    fn from_figment(figment: Figment) -> Result<GatewayConfig> {
        let config: GatewayConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow!("invalid listen address: {}", self.listen_addr));
        }
        if self.node_address.is_some() != self.private_key.is_some() {
            return Err(anyhow!(
                "node_address and private_key must be configured together"
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("max_upload_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn structured_logging(&self) -> bool {
        self.structured_logging
    }

    /// Node address and private key when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.node_address, &self.private_key) {
            (Some(node_address), Some(private_key)) => {
                Some((node_address.as_str(), private_key.as_str()))
            }
            _ => None,
        }
    }
}

fn env_provider() -> Env {
    Env::raw().only(ENV_KEYS).map(|key| {
        if key.as_str().eq_ignore_ascii_case("AKAVECLI_PATH") {
            "cli_path".into()
        } else {
            key.as_str().to_ascii_lowercase().into()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<GatewayConfig> {
        GatewayConfig::from_figment(
            Figment::from(Serialized::defaults(GatewayConfig::default()))
                .merge(Yaml::string(yaml)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = from_yaml("").unwrap();
        assert_eq!(config.cli_path, PathBuf::from("akavecli"));
        assert_eq!(config.cors_origin, "*");
        assert_eq!(config.max_upload_bytes, 52428800);
        assert!(config.download_dir.ends_with("downloads"));
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = from_yaml(
            r#"
listen_addr: "127.0.0.1:8080"
cli_path: /usr/local/bin/akavecli
node_address: "connect.akave.ai:5500"
private_key: "0xabc"
telemetry:
  enable_tracing: true
  endpoint: "http://collector:4317"
"#,
        )
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.cli_path, PathBuf::from("/usr/local/bin/akavecli"));
        assert_eq!(
            config.credentials(),
            Some(("connect.akave.ai:5500", "0xabc"))
        );
        assert!(config.telemetry.enable_tracing);
        assert_eq!(
            config.telemetry.endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_invalid_listen_addr() {
        let err = from_yaml("listen_addr: not-an-address").unwrap_err();
        assert!(err.to_string().contains("invalid listen address"));
    }

    #[test]
    fn test_credentials_must_be_paired() {
        let err = from_yaml("node_address: \"127.0.0.1:5500\"").unwrap_err();
        assert!(err.to_string().contains("configured together"));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let config = from_yaml(
            "node_address: \"127.0.0.1:5500\"\nprivate_key: \"supersecret\"",
        )
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("<redacted>"));
    }
}
