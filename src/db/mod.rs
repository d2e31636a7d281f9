pub mod models;
pub mod queries;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OpenFlags};
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_hive_schema",
    include_str!("../../migrations/001_hive_schema.sql"),
)];

/// Read-only pool over the indexer's database. The file must already exist.
///
/// Connections open read-write at the file level (a WAL database needs its
/// `-shm` file) and are locked down with `query_only`.
pub fn open_read_only(db_path: &Path, max_size: u32) -> anyhow::Result<DbPool> {
    if !db_path.exists() {
        anyhow::bail!("database {} does not exist", db_path.display());
    }

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        .with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA query_only = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });
    let pool = Pool::builder().max_size(max_size).build(manager)?;
    Ok(pool)
}

/// Writable pool, used to lay down the schema and by tests to seed rows.
pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder().max_size(4).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        Pool::builder().max_size(1).build(manager).unwrap()
    }

    #[test]
    fn migrations_create_hive_tables() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        for table in [
            "hive_accounts",
            "hive_blocks",
            "hive_communities",
            "hive_follows",
            "hive_payments",
            "hive_post_tags",
            "hive_posts",
            "hive_posts_cache",
            "hive_reblogs",
            "hive_state",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn post_uniqueness_mirrors_author_permlink() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();

        let insert = "INSERT INTO hive_posts (id, author, permlink, community, created_at) \
                      VALUES (?1, 'alice', 'hello', 'alice', '2018-01-01 00:00:00')";
        conn.execute(insert, params![1]).unwrap();
        assert!(conn.execute(insert, params![2]).is_err());
    }

    #[test]
    fn read_only_pool_rejects_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("hive.db");
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();

        drop(pool);

        let ro = open_read_only(&db_path, 2).unwrap();
        let conn = ro.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM hive_blocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(conn
            .execute(
                "INSERT INTO hive_blocks (num, hash, created_at) VALUES (1, 'h', '2018-01-01 00:00:00')",
                [],
            )
            .is_err());
    }

    #[test]
    fn read_only_pool_requires_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(open_read_only(&tmp.path().join("missing.db"), 2).is_err());
    }
}
