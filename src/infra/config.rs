//! Centralized configuration (environment variables + defaults).

use crate::domain::booking_query::{
    BookingQueryConfig, PaginationMode, SortFieldMap, DEFAULT_PAGE_SIZE,
};
use anyhow::{anyhow, Context};
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Rest,
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(Backend::Postgres),
            "rest" => Ok(Backend::Rest),
            "memory" => Ok(Backend::Memory),
            other => Err(anyhow!("BACKEND must be postgres, rest or memory (got {})", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    /// Required for the postgres backend.
    pub database_url: Option<String>,
    /// Base of every public object address.
    pub store_base_url: String,
    /// Required for the rest backend.
    pub store_api_key: Option<String>,
    pub page_size: u32,
    pub pagination: PaginationMode,
    pub bind_addr: String,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("BACKEND") {
            Some(v) => v.parse()?,
            None => Backend::Postgres,
        };

        let database_url = get("DATABASE_URL");
        let store_api_key = get("STORE_API_KEY");

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let store_base_url = match (get("STORE_BASE_URL"), backend) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Backend::Rest) => return Err(anyhow!("STORE_BASE_URL must be set for the rest backend")),
            (None, _) => format!("http://{}", bind_addr.replace("0.0.0.0", "localhost")),
        };

        match backend {
            Backend::Postgres if database_url.is_none() => {
                return Err(anyhow!("DATABASE_URL must be set for the postgres backend"));
            }
            Backend::Rest if store_api_key.is_none() => {
                return Err(anyhow!("STORE_API_KEY must be set for the rest backend"));
            }
            _ => {}
        }

        let page_size = match get("PAGE_SIZE") {
            Some(v) => v
                .parse::<u32>()
                .context("PAGE_SIZE must be a valid u32")?
                .max(1),
            None => DEFAULT_PAGE_SIZE,
        };

        let pagination = match get("PAGINATION_MODE") {
            Some(v) => v.parse::<PaginationMode>().map_err(|e| anyhow!(e))?,
            None => PaginationMode::default(),
        };

        let max_connections = match get("MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .context("MAX_CONNECTIONS must be a valid u32")?
                .max(1),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            backend,
            database_url,
            store_base_url,
            store_api_key,
            page_size,
            pagination,
            bind_addr,
            max_connections,
        })
    }

    pub fn query_config(&self) -> BookingQueryConfig {
        BookingQueryConfig {
            sort_fields: SortFieldMap::default(),
            page_size: self.page_size,
            pagination: self.pagination,
        }
    }
}
