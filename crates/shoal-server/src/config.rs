use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Chain length past which a bucket is flagged as a compaction
    /// candidate. `None` disables the advice.
    pub compaction_threshold: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9410".parse().unwrap(),
            compaction_threshold: Some(64),
        }
    }
}
