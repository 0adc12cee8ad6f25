//! SQLite store with Diesel ORM
//!
//! Keyed upserts and deletes instead of whole-collection rewrites. Timestamps
//! are stored in the fixed-width ISO form from [`format_timestamp`], so text
//! comparison in SQL is chronological.

use super::{builtin_kind_definitions, PracticeStore, LAST_ITEM_KEY};
use crate::error::{Error, Result};
use crate::kinds::{Kind, KindDefinition};
use crate::model::{format_timestamp, parse_timestamp, ItemValues, LogFilter, PracticeItem, PracticeLog};
use crate::schema::*;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::Path;

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Stored practice item
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = practice_items)]
struct ItemRow {
    id: String,
    title: String,
    kind: String,
    values_json: String,
    pinned: bool,
    allow_burst: bool,
    completed: bool,
}

/// Stored practice log
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = practice_logs)]
struct LogRow {
    id: String,
    date_time: String,
    item_id: String,
    mode: String,
    minutes: i32,
    values_json: String,
    notes_awarded: i32,
}

impl ItemRow {
    fn from_item(item: &PracticeItem) -> Result<Self> {
        Ok(Self {
            id: item.id.clone(),
            title: item.title.clone(),
            kind: item.kind().as_str().to_string(),
            values_json: serde_json::to_string(&item.values.to_json())?,
            pinned: item.pinned,
            allow_burst: item.allow_burst,
            completed: item.completed,
        })
    }

    fn into_item(self) -> Result<PracticeItem> {
        let kind: Kind = self
            .kind
            .parse()
            .map_err(|e| Error::Validation(format!("Stored item {}: {}", self.id, e)))?;
        let values = ItemValues::from_json(kind, serde_json::from_str(&self.values_json)?)?;
        Ok(PracticeItem {
            id: self.id,
            title: self.title,
            values,
            pinned: self.pinned,
            allow_burst: self.allow_burst,
            completed: self.completed,
        })
    }
}

impl LogRow {
    fn from_log(log: &PracticeLog) -> Result<Self> {
        Ok(Self {
            id: log.id.clone(),
            date_time: format_timestamp(&log.date_time),
            item_id: log.item_id.clone(),
            mode: log.mode.clone(),
            minutes: i32::try_from(log.minutes).unwrap_or(i32::MAX),
            values_json: serde_json::to_string(&log.values)?,
            notes_awarded: i32::try_from(log.notes_awarded).unwrap_or(i32::MAX),
        })
    }

    fn into_log(self) -> Result<PracticeLog> {
        Ok(PracticeLog {
            id: self.id,
            date_time: parse_timestamp(&self.date_time)?,
            item_id: self.item_id,
            mode: self.mode,
            minutes: u32::try_from(self.minutes).unwrap_or(0),
            values: serde_json::from_str(&self.values_json)?,
            notes_awarded: u32::try_from(self.notes_awarded).unwrap_or(0),
        })
    }
}

/// SQLite-backed store with a small connection pool
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        Self::with_pool(&path_str, 5)
    }

    /// Private in-memory database. One connection, since every SQLite memory
    /// connection is its own database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_pool(":memory:", 1)
    }

    fn with_pool(url: &str, max_size: u32) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

impl PracticeStore for SqliteStore {
    fn init(&mut self) -> Result<()> {
        let mut conn = self.get_conn()?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS practice_items (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                values_json TEXT NOT NULL DEFAULT '{}',
                pinned BOOLEAN NOT NULL DEFAULT 0,
                allow_burst BOOLEAN NOT NULL DEFAULT 0,
                completed BOOLEAN NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&mut conn)?;

        // No foreign key: logs may outlive their item until the cascade runs
        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS practice_logs (
                id TEXT PRIMARY KEY NOT NULL,
                date_time TEXT NOT NULL,
                item_id TEXT NOT NULL,
                mode TEXT NOT NULL,
                minutes INTEGER NOT NULL DEFAULT 0,
                values_json TEXT NOT NULL DEFAULT '{}',
                notes_awarded INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS practice_settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_items_kind ON practice_items(kind)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_logs_item ON practice_logs(item_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_logs_date_time ON practice_logs(date_time)")
            .execute(&mut conn)?;

        Ok(())
    }

    fn kind_definitions(&self) -> Result<&'static [&'static KindDefinition]> {
        Ok(builtin_kind_definitions())
    }

    fn list_items(&self) -> Result<Vec<PracticeItem>> {
        let mut conn = self.get_conn()?;
        let rows = practice_items::table
            .select(ItemRow::as_select())
            .load::<ItemRow>(&mut conn)?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    fn get_item(&self, id: &str) -> Result<Option<PracticeItem>> {
        let mut conn = self.get_conn()?;
        let row = practice_items::table
            .filter(practice_items::id.eq(id))
            .select(ItemRow::as_select())
            .first::<ItemRow>(&mut conn)
            .optional()?;
        row.map(ItemRow::into_item).transpose()
    }

    fn upsert_item(&mut self, item: PracticeItem) -> Result<PracticeItem> {
        let mut conn = self.get_conn()?;
        let row = ItemRow::from_item(&item)?;

        diesel::insert_into(practice_items::table)
            .values(&row)
            .on_conflict(practice_items::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;

        Ok(item)
    }

    fn delete_item(&mut self, id: &str) -> Result<()> {
        let mut conn = self.get_conn()?;

        let removed = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let logs = diesel::delete(practice_logs::table.filter(practice_logs::item_id.eq(id))).execute(conn)?;
            diesel::delete(practice_items::table.filter(practice_items::id.eq(id))).execute(conn)?;
            Ok(logs)
        })?;

        if removed > 0 {
            log::debug!("Deleted {} log(s) of item {}", removed, id);
        }
        Ok(())
    }

    fn list_logs(&self, filter: &LogFilter) -> Result<Vec<PracticeLog>> {
        let mut conn = self.get_conn()?;
        let mut query = practice_logs::table.select(LogRow::as_select()).into_boxed();

        if let Some(from) = &filter.from {
            query = query.filter(practice_logs::date_time.ge(format_timestamp(from)));
        }
        if let Some(to) = &filter.to {
            query = query.filter(practice_logs::date_time.le(format_timestamp(to)));
        }
        if let Some(item_id) = &filter.item_id {
            query = query.filter(practice_logs::item_id.eq(item_id.clone()));
        }
        if let Some(kind) = filter.kind {
            let item_ids: Vec<String> = practice_items::table
                .filter(practice_items::kind.eq(kind.as_str()))
                .select(practice_items::id)
                .load(&mut conn)?;
            query = query.filter(practice_logs::item_id.eq_any(item_ids));
        }

        let rows = query
            .order(practice_logs::date_time.desc())
            .load::<LogRow>(&mut conn)?;
        rows.into_iter().map(LogRow::into_log).collect()
    }

    fn add_log(&mut self, log: PracticeLog) -> Result<PracticeLog> {
        let mut conn = self.get_conn()?;
        let row = LogRow::from_log(&log)?;
        diesel::insert_into(practice_logs::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(log)
    }

    fn delete_log(&mut self, id: &str) -> Result<()> {
        let mut conn = self.get_conn()?;
        diesel::delete(practice_logs::table.filter(practice_logs::id.eq(id))).execute(&mut conn)?;
        Ok(())
    }

    fn last_item_id(&self) -> Result<Option<String>> {
        let mut conn = self.get_conn()?;
        let value = practice_settings::table
            .filter(practice_settings::key.eq(LAST_ITEM_KEY))
            .select(practice_settings::value)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(value.filter(|id| !id.is_empty()))
    }

    fn set_last_item_id(&mut self, id: &str) -> Result<()> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(practice_settings::table)
            .values((practice_settings::key.eq(LAST_ITEM_KEY), practice_settings::value.eq(id)))
            .on_conflict(practice_settings::key)
            .do_update()
            .set(practice_settings::value.eq(id))
            .execute(&mut conn)?;
        Ok(())
    }
}
