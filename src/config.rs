use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub integration_rps: u32,
    pub public_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: require_env("SERVER_ADDRESS")?,
            jwt_secret: require_env("JWT_SECRET")?,
            integration_rps: require_parsed("INTEGRATION_RPS")?,
            public_rps: require_parsed("PUBLIC_RPS")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} must be set", name)))
}

fn require_parsed<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    require_env(name)?
        .parse()
        .map_err(|e| Error::Config(format!("{} is not valid: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
