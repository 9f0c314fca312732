//! Command-line configuration

use std::net::SocketAddr;

use clap::Parser;

/// Line-oriented TCP chat server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8081")]
    pub listen: SocketAddr,

    /// Capacity of the server command channel
    #[arg(long, default_value_t = 256)]
    pub command_buffer: usize,

    /// Longest accepted input line, in bytes
    #[arg(long, default_value_t = 4096)]
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8081)),
            command_buffer: 256,
            max_line_length: 4096,
        }
    }
}
