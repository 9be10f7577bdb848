use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::pkg::internal::workflow::CapacityRule;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub service_name: String,
    pub listen_port: String,
    //db
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub database_pool_max_connections: u32,
    //workflow
    pub supervisor_max_paired: i64,
    #[serde(default)]
    pub supervisor_max_solo: Option<i64>,
    pub token_ttl_hours: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .set_default("service_name", "stagehub")?
            .set_default("listen_port", "3000")?
            .set_default("db_host", "localhost")?
            .set_default("db_port", "5432")?
            .set_default("db_user", "postgres")?
            .set_default("db_password", "postgres")?
            .set_default("db_name", "stagehub")?
            .set_default("database_pool_max_connections", "10")?
            .set_default("supervisor_max_paired", "2")?
            .set_default("token_ttl_hours", "24")?
            .add_source(Environment::default())
            .build()?;
        conf.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    pub fn capacity_rule(&self) -> CapacityRule {
        CapacityRule {
            max_paired: self.supervisor_max_paired,
            max_solo: self.supervisor_max_solo,
        }
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
