use std::net::Ipv4Addr;

use config::{Config, ConfigError, Environment, Source};
use rocket::figment::Figment;
use serde::Deserialize;

/// Name of the pool in Rocket's `databases` table; see [`crate::db::DbConn`].
pub const DATABASE_NAME: &str = "items";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: Option<String>,
    pub app_db_user: String,
    pub app_db_password: String,
    pub db_host: String,
    pub db_port: u16,
    pub app_db_name: String,
    pub secret_key: Option<String>,
    pub port: u16,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    pub(crate) fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("app_db_user", "app_user")?
            .set_default("app_db_password", "app_password")?
            .set_default("db_host", "db")?
            .set_default("db_port", 5432_i64)?
            .set_default("app_db_name", "app_db")?
            .set_default("port", 8000_i64)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// `DATABASE_URL` when present, otherwise assembled from the individual parts.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => strip_driver_suffix(url),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.app_db_user, self.app_db_password, self.db_host, self.db_port, self.app_db_name
            ),
        }
    }

    pub fn figment(&self) -> Figment {
        let figment = rocket::Config::figment()
            .merge(("address", Ipv4Addr::UNSPECIFIED))
            .merge(("port", self.port))
            .merge((
                format!("databases.{}.url", DATABASE_NAME),
                self.database_url(),
            ));

        match &self.secret_key {
            Some(key) => figment.merge(("secret_key", key)),
            None => figment,
        }
    }
}

// `postgresql+psycopg2://...` -> `postgresql://...`
fn strip_driver_suffix(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match scheme.split_once('+') {
            Some((base, _driver)) => format!("{}://{}", base, rest),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
