//! Process configuration from environment variables.

use ingest_scheduler::SchedulerConfig;
use ingest_service::ServiceConfig;
use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub service: ServiceConfig,
    pub scheduler: SchedulerConfig,
    /// SQLite database file; in-memory store when `None`.
    pub sqlite_path: Option<String>,
}

impl AppConfig {
    /// `INGEST_LISTEN` wins over `PORT`; both fall back to `0.0.0.0:5000`.
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let listen = match std::env::var("INGEST_LISTEN") {
            Ok(addr) => addr.parse()?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], port_from(std::env::var("PORT").ok()))),
        };
        Ok(Self {
            listen,
            service: ServiceConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            sqlite_path: std::env::var("INGEST_SQLITE_PATH").ok(),
        })
    }
}

fn port_from(raw: Option<String>) -> u16 {
    let Some(raw) = raw else {
        return DEFAULT_PORT;
    };
    match raw.trim().parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            tracing::warn!(value = %raw, "invalid PORT; using default");
            DEFAULT_PORT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_to_default_on_bad_input() {
        assert_eq!(port_from(None), DEFAULT_PORT);
        assert_eq!(port_from(Some("8080".into())), 8080);
        assert_eq!(port_from(Some("http".into())), DEFAULT_PORT);
        assert_eq!(port_from(Some("70000".into())), DEFAULT_PORT);
    }
}
