use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_allow_origin: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("TAG_REGISTRY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("TAG_REGISTRY_PORT")
            .unwrap_or_else(|_| "8091".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("Invalid TAG_REGISTRY_PORT: {}", e))?;
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tag-registry.db".to_string());
        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string());

        Ok(Config {
            host,
            port,
            database_url,
            cors_allow_origin,
        })
    }
}
