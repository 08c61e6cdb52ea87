use config::Config;
use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// Postgres schema holding every platform table.
pub const DB_SCHEMA: &str = "meetings_platform";

/// Pool options for the platform database, searched in the platform schema.
pub fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new::<&str>(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug)
        .set_schema_search_path(DB_SCHEMA);
    opt
}

pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Connecting to the meetings database (pool {}..={}, acquire timeout {}s)",
        config.db_min_connections, config.db_max_connections, config.db_acquire_timeout_secs,
    );

    Database::connect(connect_options(config)).await
}

/// Infrastructure shared by every request handler and the job worker.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, db: &Arc<DatabaseConnection>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config: app_config,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_options_follow_the_config() {
        let config = Config::from_args([
            "meetings_platform_rs",
            "--db-max-connections",
            "7",
            "--db-acquire-timeout-secs",
            "3",
        ]);

        let opt = connect_options(&config);

        assert_eq!(opt.get_max_connections(), Some(7));
        assert_eq!(opt.get_acquire_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(opt.get_schema_search_path(), Some(&DB_SCHEMA.to_string()));
    }
}
