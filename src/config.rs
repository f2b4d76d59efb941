use std::{env, net::SocketAddr};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tripplan.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "change-me-tripplan-development-secret".to_string());

        let token_ttl_minutes = match env::var("TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| AppError::Config(format!("invalid TOKEN_TTL_MINUTES: {raw}")))?,
            Err(_) => 60,
        };

        Ok(Self {
            database_url,
            listen_addr,
            jwt_secret,
            token_ttl_minutes,
        })
    }
}
