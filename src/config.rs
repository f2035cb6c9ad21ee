use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub pool_size: u32,
    pub sweep_interval: Duration,
}

impl Config {
    /// Reads configuration once at startup. Missing required variables abort
    /// the process before it binds a socket.
    pub fn from_env() -> Config {
        let port = std::env::var("PORT")
            .expect("env PORT")
            .parse::<u16>()
            .expect("PORT must be a port number");
        let database_url = std::env::var("DATABASE_URL").expect("env DATABASE_URL");
        let pool_size = std::env::var("POOL_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .expect("POOL_SIZE must be a positive integer");
        let sweep_interval = std::env::var("SWEEP_INTERVAL")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .expect("SWEEP_INTERVAL must be a number of seconds");

        Config {
            port,
            database_url,
            pool_size,
            sweep_interval: Duration::from_secs(sweep_interval),
        }
    }
}
