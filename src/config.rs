//! Process configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::fetch::DEFAULT_MAX_LOGO_BYTES;
use crate::profile::{ProfileError, StyleProfile};

/// Default request body cap for uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "caption-renderer", version, about = "Captioned image compositing over HTTP")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Style profile JSON. Built-in defaults when omitted.
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Total time allowed for a logo fetch.
    #[arg(long, default_value_t = 10)]
    pub logo_timeout_secs: u64,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Largest logo body downloaded, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LOGO_BYTES)]
    pub max_logo_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn logo_timeout(&self) -> Duration {
        Duration::from_secs(self.logo_timeout_secs)
    }

    /// Loads and validates the style profile, if one was given.
    pub fn load_profile(&self) -> Result<StyleProfile, ProfileError> {
        match &self.style {
            Some(path) => StyleProfile::from_file(path),
            None => Ok(StyleProfile::default()),
        }
    }
}
