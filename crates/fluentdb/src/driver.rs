//! Database drivers: turn a [`DbConfig`] into a live [`Connection`].

use crate::client::Connection;
use crate::config::DbConfig;
use crate::error::OrmResult;
use std::future::Future;

/// Establishes a verified connection.
pub trait Driver {
    type Conn: Connection;

    fn load(&self) -> impl Future<Output = OrmResult<Self::Conn>> + Send;
}

/// PostgreSQL over a deadpool pool.
#[cfg(feature = "pool")]
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    config: DbConfig,
}

#[cfg(feature = "pool")]
impl PostgresDriver {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> OrmResult<Self> {
        DbConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

#[cfg(feature = "pool")]
impl Driver for PostgresDriver {
    type Conn = crate::pool::PgConnection;

    async fn load(&self) -> OrmResult<Self::Conn> {
        use crate::pool::{create_pool_with_manager_config, default_manager_config};

        let url = self.config.postgres_url()?;
        let max_size = self.config.pool_size();
        let wait = self.config.wait_timeout;
        let pool = create_pool_with_manager_config(
            &url,
            tokio_postgres::NoTls,
            default_manager_config(),
            |builder| {
                let builder = builder.max_size(max_size);
                match wait {
                    Some(timeout) => builder
                        .wait_timeout(Some(timeout))
                        .runtime(deadpool_postgres::Runtime::Tokio1),
                    None => builder,
                }
            },
        )?;

        let conn = crate::pool::PgConnection::new(pool);
        conn.ping().await?;
        tracing::debug!(
            target: "fluentdb.pool",
            host = %self.config.host,
            database = %self.config.database,
            max_size,
            "connected to PostgreSQL"
        );
        Ok(conn)
    }
}

/// MySQL over a `mysql_async` pool.
#[cfg(feature = "mysql")]
#[derive(Debug, Clone)]
pub struct MySqlDriver {
    config: DbConfig,
}

#[cfg(feature = "mysql")]
impl MySqlDriver {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> OrmResult<Self> {
        DbConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

#[cfg(feature = "mysql")]
impl Driver for MySqlDriver {
    type Conn = crate::mysql::MySqlConnection;

    async fn load(&self) -> OrmResult<Self::Conn> {
        use crate::error::OrmError;
        use mysql_async::{OptsBuilder, PoolConstraints, PoolOpts};

        let url = self.config.mysql_url()?;
        let opts = mysql_async::Opts::from_url(&url)
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        let constraints = PoolConstraints::new(1, self.config.pool_size())
            .ok_or_else(|| OrmError::validation("DB_MAX_CONNECTION must be at least 1"))?;
        let opts = OptsBuilder::from_opts(opts)
            .pool_opts(PoolOpts::default().with_constraints(constraints));

        let conn = crate::mysql::MySqlConnection::new(mysql_async::Pool::new(opts));
        conn.ping().await?;
        tracing::debug!(
            target: "fluentdb.pool",
            host = %self.config.host,
            database = %self.config.database,
            "connected to MySQL"
        );
        Ok(conn)
    }
}
