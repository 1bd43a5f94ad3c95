use std::env;

use crate::protocol::DEFAULT_PORT;

/// Viewer configuration sourced from the environment. Command-line flags
/// take precedence over these values.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("NETGRIDVIZ_PORT")
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { port }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}
