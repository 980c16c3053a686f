use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use pennywise_core::fx::{CurrencyRate, CurrencyRepositoryTrait};
use pennywise_core::Result;

use super::model::CurrencyDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::currencies;

/// SQLite-backed currency store. Reads use the pool, writes go through the
/// single writer.
pub struct CurrencyRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CurrencyRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CurrencyRepositoryTrait for CurrencyRepository {
    fn list_by_base(&self, base_currency: &str) -> Result<Vec<CurrencyRate>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = currencies::table
            .filter(currencies::base_currency.eq(base_currency))
            .order(currencies::code.asc())
            .select(CurrencyDB::as_select())
            .load::<CurrencyDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(CurrencyRate::from).collect())
    }

    fn get_by_code(&self, code: &str, base_currency: &str) -> Result<Option<CurrencyRate>> {
        let mut conn = get_connection(&self.pool)?;
        let row = currencies::table
            .find((code, base_currency))
            .select(CurrencyDB::as_select())
            .first::<CurrencyDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(CurrencyRate::from))
    }

    fn latest_update(&self, base_currency: &str) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<NaiveDateTime> = currencies::table
            .filter(currencies::base_currency.eq(base_currency))
            .select(max(currencies::updated_at))
            .first(&mut conn)
            .into_core()?;
        Ok(latest.map(|ts| Utc.from_utc_datetime(&ts)))
    }

    async fn upsert_batch(&self, rates: Vec<CurrencyRate>) -> Result<usize> {
        if rates.is_empty() {
            return Ok(0);
        }
        let rows: Vec<CurrencyDB> = rates.into_iter().map(CurrencyDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for row in &rows {
                    written += diesel::insert_into(currencies::table)
                        .values(row)
                        .on_conflict((currencies::code, currencies::base_currency))
                        .do_update()
                        .set(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                log::debug!("Upserted {} currency rows", written);
                Ok(written)
            })
            .await
    }
}
