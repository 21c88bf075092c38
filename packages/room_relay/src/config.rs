use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use room_broadcaster::BroadcasterConfig;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   config.toml:     [server]
//                    port = 8000
//
//   env var:         RELAY_SERVER__PORT=8000   (double underscore = nesting)
//
//   CLI flag:        relay --port 8000          (wins over both)

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub websocket: WebSocketFileConfig,
}

/// Listener settings (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Per-connection tunables (lives under `[websocket]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebSocketFileConfig {
    #[serde(default = "default_send_channel_capacity")]
    pub send_channel_capacity: usize,
    #[serde(default = "default_display_name")]
    pub default_display_name: String,
    #[serde(default = "default_max_display_name_chars")]
    pub max_display_name_chars: usize,
}

impl Default for WebSocketFileConfig {
    fn default() -> Self {
        Self {
            send_channel_capacity: default_send_channel_capacity(),
            default_display_name: default_display_name(),
            max_display_name_chars: default_max_display_name_chars(),
        }
    }
}

fn default_send_channel_capacity() -> usize {
    100
}
fn default_display_name() -> String {
    "User".to_string()
}
fn default_max_display_name_chars() -> usize {
    32
}

/// Build a figment that layers: defaults → config.toml → RELAY_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `RELAY_SERVER__HOST=0.0.0.0`  →  `server.host = "0.0.0.0"`
///   `RELAY_WEBSOCKET__SEND_CHANNEL_CAPACITY=256`  →  `websocket.send_channel_capacity = 256`
pub fn load_config(config_path: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_path))
        .merge(Env::prefixed("RELAY_").split("__"))
}

/// Command-line values that take priority over the file/env layers.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

// =============================================================================
// Runtime config structs (derived from FileConfig, used throughout the server)
// =============================================================================

/// Server configuration for runtime behavior.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub websocket: WebSocketConfig,
}

#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// Outbound queue depth per connection
    pub send_channel_capacity: usize,
    /// Sender label for clients that do not supply a name
    pub default_display_name: String,
    pub max_display_name_chars: usize,
}

impl WebSocketConfig {
    /// Resolve the sender label for a new connection.
    pub fn display_name(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.chars().take(self.max_display_name_chars).collect(),
            None => self.default_display_name.clone(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(fc: &FileConfig, overrides: &CliOverrides) -> Result<Self> {
        let host = overrides
            .host
            .clone()
            .or_else(|| fc.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = overrides.port.or(fc.server.port).unwrap_or(DEFAULT_PORT);
        let bind_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address: {}:{}", host, port))?;

        Ok(Self {
            bind_addr,
            websocket: WebSocketConfig {
                send_channel_capacity: fc.websocket.send_channel_capacity.max(1),
                default_display_name: fc.websocket.default_display_name.clone(),
                max_display_name_chars: fc.websocket.max_display_name_chars.max(1),
            },
        })
    }

    pub fn broadcaster_config(&self) -> BroadcasterConfig {
        BroadcasterConfig {
            channel_capacity: self.websocket.send_channel_capacity,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], DEFAULT_PORT).into(),
            websocket: WebSocketConfig {
                send_channel_capacity: default_send_channel_capacity(),
                default_display_name: default_display_name(),
                max_display_name_chars: default_max_display_name_chars(),
            },
        }
    }
}
