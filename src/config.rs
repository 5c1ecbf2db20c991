use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub sweep_interval_seconds: u64,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://leadrouter.db?mode=rwc".to_string());

        let sweep_interval_seconds = env::var("SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidSweepInterval)?;

        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "leadrouter".to_string());

        let metrics_port = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidMetricsPort)?;

        Ok(Config {
            database_url,
            sweep_interval_seconds,
            otel_exporter_endpoint,
            service_name,
            metrics_port,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SWEEP_INTERVAL_SECONDS must be a positive integer")]
    InvalidSweepInterval,

    #[error("METRICS_PORT must be a valid port number")]
    InvalidMetricsPort,
}
