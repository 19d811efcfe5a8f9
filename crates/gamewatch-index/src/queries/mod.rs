pub mod history;
pub mod session;
pub mod status;

use chrono::{DateTime, SecondsFormat, Utc};
use gamewatch_types::ServerId;
use rusqlite::Row;
use rusqlite::types::Type;

/// Fixed-width RFC 3339 text; lexical order matches time order.
pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => ts_column(row, idx).map(Some),
    }
}

pub(crate) fn server_id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ServerId> {
    let id: i64 = row.get(idx)?;
    Ok(ServerId::new(id as u64))
}

pub(crate) fn server_id_to_sql(id: ServerId) -> i64 {
    id.get() as i64
}
