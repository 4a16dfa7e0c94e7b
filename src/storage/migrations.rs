use anyhow::{Context, Result};
use rusqlite::Connection;

pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "recommendations_and_sessions",
        sql: include_str!("../../migrations/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "event_log",
        sql: include_str!("../../migrations/002_event_log.sql"),
    },
];

pub fn get_schema_version(connection: &Connection) -> Result<i32> {
    connection
        .execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )
        .context("Failed to create schema_version table")?;

    let version = connection
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get::<_, i32>(0),
        )
        .context("Failed to read schema version")?;

    Ok(version)
}

/// Apply every migration newer than the stored schema version, each in its own transaction
pub fn apply_migrations(connection: &Connection) -> Result<()> {
    let current_version = get_schema_version(connection)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");

        let tx = connection
            .unchecked_transaction()
            .context("Failed to begin migration transaction")?;

        tx.execute_batch(migration.sql)
            .with_context(|| format!("Failed to apply migration {}", migration.version))?;

        tx.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .with_context(|| format!("Failed to update schema version to {}", migration.version))?;

        tx.commit()
            .with_context(|| format!("Failed to commit migration {}", migration.version))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_connection() -> Connection {
        Connection::open(":memory:").unwrap()
    }

    fn table_count(conn: &Connection) -> i32 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('analysis_sessions', 'recommendations', 'event_log')",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_schema_version() {
        let conn = setup_test_connection();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_migration_application() {
        let conn = setup_test_connection();
        apply_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        assert_eq!(table_count(&conn), 3);
    }

    #[test]
    fn test_idempotent_migrations() {
        let conn = setup_test_connection();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        assert_eq!(table_count(&conn), 3);
    }

    #[test]
    fn test_sessions_have_no_status_column() {
        let conn = setup_test_connection();
        apply_migrations(&conn).unwrap();

        let status_columns: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('analysis_sessions') WHERE name = 'status'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(status_columns, 0);
    }

    #[test]
    fn test_migration_order() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[1].version > pair[0].version);
        }
    }
}
