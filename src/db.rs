use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::entities::{NewVendor, Vendor, VendorFilter, VendorId, VendorPatch};
use crate::error::{Result, StoreError};
use crate::store::VendorStore;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(journal_mode = %mode, "database journal mode");

    // ==========================================================================
    // Vendor Table
    // AUTOINCREMENT keeps ids of deleted rows from being handed out again
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS vendor (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            registered TEXT NOT NULL,
            name TEXT NOT NULL,
            comment TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_vendor_name ON vendor(name)",
        [],
    )?;

    Ok(())
}

/// Count vendor rows
pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM vendor", [], |row| row.get(0))?;

    Ok(count)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn row_to_vendor(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    let registered_str: String = row.get(1)?;
    let registered = DateTime::parse_from_rfc3339(&registered_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Vendor {
        id: VendorId(row.get(0)?),
        registered,
        name: row.get(2)?,
        comment: row.get(3)?,
    })
}

const SELECT_VENDOR: &str = "SELECT id, registered, name, comment FROM vendor";

/// Vendor store persisted in SQLite
///
/// One connection behind a mutex: every operation runs while holding it,
/// updates additionally inside a transaction.
pub struct SqliteVendorStore<C = SystemClock> {
    conn: Mutex<Connection>,
    clock: C,
}

impl SqliteVendorStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened vendor database");
        Self::with_clock(conn, SystemClock)
    }

    /// Private database that disappears with the store
    pub fn open_in_memory() -> Result<Self> {
        Self::with_clock(Connection::open_in_memory()?, SystemClock)
    }
}

impl<C: Clock> SqliteVendorStore<C> {
    pub fn with_clock(conn: Connection, clock: C) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteVendorStore {
            conn: Mutex::new(conn),
            clock,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn count(&self) -> Result<i64> {
        verify_count(&self.conn())
    }
}

impl<C: Clock> VendorStore for SqliteVendorStore<C> {
    fn create(&self, new: NewVendor) -> Result<Vendor> {
        let registered = self.clock.now();
        let conn = self.conn();

        conn.execute(
            "INSERT INTO vendor (registered, name, comment) VALUES (?1, ?2, ?3)",
            params![format_timestamp(&registered), new.name, new.comment],
        )?;
        let id = VendorId(conn.last_insert_rowid());

        debug!(vendor_id = %id, "vendor created");
        Ok(Vendor {
            id,
            registered,
            name: new.name,
            comment: new.comment,
        })
    }

    fn get(&self, id: VendorId) -> Result<Vendor> {
        self.conn()
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_VENDOR),
                params![id.0],
                row_to_vendor,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self, filter: &VendorFilter) -> Result<Vec<Vendor>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE (?1 IS NULL OR name = ?1) ORDER BY id",
            SELECT_VENDOR
        ))?;

        let vendors = stmt
            .query_map(params![filter.name], row_to_vendor)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(vendors)
    }

    fn update(&self, id: VendorId, patch: VendorPatch) -> Result<Vendor> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut vendor = tx
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_VENDOR),
                params![id.0],
                row_to_vendor,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        vendor.apply(patch);

        tx.execute(
            "UPDATE vendor SET name = ?1, comment = ?2 WHERE id = ?3",
            params![vendor.name, vendor.comment, id.0],
        )?;
        tx.commit()?;

        debug!(vendor_id = %id, "vendor updated");
        Ok(vendor)
    }

    fn delete(&self, id: VendorId) -> Result<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM vendor WHERE id = ?1", params![id.0])?;

        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!(vendor_id = %id, "vendor deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::conformance;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn test_store() -> (SqliteVendorStore<Arc<FixedClock>>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteVendorStore::with_clock(conn, Arc::clone(&clock)).unwrap();
        (store, clock)
    }

    #[test]
    fn test_setup_database_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_timestamp_round_trips_with_subsecond_precision() {
        let clock = FixedClock::new(Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap());
        let store =
            SqliteVendorStore::with_clock(Connection::open_in_memory().unwrap(), clock).unwrap();

        let created = store.create(NewVendor::new("John")).unwrap();
        let fetched = store.get(created.id).unwrap();

        assert_eq!(fetched.registered, created.registered);
        assert_eq!(fetched.registered.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_non_ascii_comment_is_stored_verbatim() {
        let (store, _) = test_store();

        let comment = "abcdefghåäö 日本語 🧵";
        let created = store
            .create(NewVendor::new("Prusa").with_comment(comment))
            .unwrap();

        let raw: String = store
            .conn()
            .query_row(
                "SELECT comment FROM vendor WHERE id = ?1",
                params![created.id.0],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw, comment);
        assert_eq!(store.get(created.id).unwrap().comment.as_deref(), Some(comment));
    }

    #[test]
    fn test_deleted_ids_are_not_reused_after_reopen() {
        let dir = std::env::temp_dir().join(format!("spoolstock-db-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spoolstock.db");

        let last_id = {
            let store = SqliteVendorStore::open(&path).unwrap();
            store.create(NewVendor::new("John")).unwrap();
            let second = store.create(NewVendor::new("Stan")).unwrap();
            store.delete(second.id).unwrap();
            second.id
        };

        let store = SqliteVendorStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let next = store.create(NewVendor::new("Stan")).unwrap();
        assert!(next.id > last_id);

        drop(store);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_sqlite_conformance() {
        conformance::run_all(test_store);
    }
}
