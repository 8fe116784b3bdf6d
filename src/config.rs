use std::env;

use crate::series::classifier::{ColumnNaming, DEFAULT_DATE_COLUMN, DEFAULT_RAINFALL_COLUMN};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub preview_rows: usize,
    pub max_upload_bytes: usize,
    pub date_column: String,
    pub rainfall_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            preview_rows: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            rainfall_column: DEFAULT_RAINFALL_COLUMN.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            preview_rows: env::var("PREVIEW_ROWS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.preview_rows),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            date_column: env::var("DATE_COLUMN").unwrap_or(defaults.date_column),
            rainfall_column: env::var("RAINFALL_COLUMN").unwrap_or(defaults.rainfall_column),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn column_naming(&self) -> ColumnNaming {
        ColumnNaming {
            date_column: self.date_column.clone(),
            rainfall_column: self.rainfall_column.clone(),
        }
    }
}
