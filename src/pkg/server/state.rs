use std::{future::Future, sync::Arc};

use sqlx::{PgPool, Pool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{conf::settings, pkg::internal::workflow::CapacityRule, prelude::Result};

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url())?;
    Ok(pool)
}

pub trait GetTxn {
    fn begin_txn(&self) -> impl Future<Output = Result<Transaction<'static, Postgres>>> + Send;
}

impl GetTxn for PgPool {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.begin().await?)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub capacity: CapacityRule,
}

impl AppState {
    pub fn new() -> Result<AppState> {
        Ok(AppState {
            db_pool: Arc::new(db_pool()?),
            capacity: settings.capacity_rule(),
        })
    }
}
