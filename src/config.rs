use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub upload_limit_bytes: usize,
    pub jwt_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let upload_limit_bytes = env_u64("UPLOAD_LIMIT_BYTES")
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_UPLOAD_LIMIT_BYTES);

        Self {
            host,
            port,
            log_level,
            upload_limit_bytes,
            jwt_secret: env_string("JWT_SECRET"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            log_level: "info".to_string(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            jwt_secret: None,
        }
    }
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match env_string(key) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}
