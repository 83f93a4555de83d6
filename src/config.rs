//! Keywarden server configuration.

use crate::KeywardenError;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default port when neither `--port` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Default admin shared secret when neither flag nor `ADMIN_PASSWORD` is set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123456";

/// Runtime configuration for the key server.
///
/// Every value can come from a flag or from the environment; flags win.
#[derive(Debug, Clone, Parser)]
#[command(name = "keywarden")]
#[command(about = "License key validation server with HWID binding")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "KEYWARDEN_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Shared secret for the admin panel.
    #[arg(
        long,
        env = "ADMIN_PASSWORD",
        default_value = DEFAULT_ADMIN_PASSWORD,
        hide_env_values = true
    )]
    pub admin_password: String,

    /// SQLite database file.
    #[arg(long, env = "DATABASE_PATH", default_value = "database.db")]
    pub database: PathBuf,

    /// Directory served at `/` (admin panel assets).
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Enable verbose debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeywardenError> {
        if self.port == 0 {
            return Err(KeywardenError::Config("port cannot be 0".to_string()));
        }
        if self.admin_password.is_empty() {
            return Err(KeywardenError::Config(
                "admin_password cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address the HTTP listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        ServerConfig::try_parse_from(args).unwrap()
    }

    #[test]
    fn explicit_flags_are_used() {
        let config = parse(&[
            "keywarden",
            "--port",
            "9000",
            "--admin-password",
            "s3cret",
            "--database",
            "/tmp/keys.db",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.database, PathBuf::from("/tmp/keys.db"));
    }

    #[test]
    fn listen_addr_combines_host_and_port() {
        let config = parse(&["keywarden", "--host", "127.0.0.1", "--port", "9001"]);
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9001");
    }

    #[test]
    fn validate_rejects_empty_password() {
        let mut config = parse(&["keywarden", "--port", "9000"]);
        config.admin_password = String::new();
        assert!(matches!(config.validate(), Err(KeywardenError::Config(_))));
    }

    #[test]
    fn validate_rejects_port_zero() {
        let config = parse(&["keywarden", "--port", "0", "--admin-password", "x"]);
        assert!(matches!(config.validate(), Err(KeywardenError::Config(_))));
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = parse(&["keywarden", "--port", "8080", "--admin-password", "x"]);
        assert!(config.validate().is_ok());
    }
}
