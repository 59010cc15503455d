use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::resource::{FieldKind, RESOURCES};

/// Open (or create) the workspace database and bring the schema up to date.
/// Resource tables are generated from the resource specs so the schema and
/// the handlers can never disagree about columns.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("sekolah.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    for spec in RESOURCES {
        let mut columns = vec!["id TEXT PRIMARY KEY".to_string()];
        for field in spec.fields {
            let sql_type = match field.kind {
                FieldKind::Integer { .. } => "INTEGER",
                FieldKind::Text | FieldKind::Image | FieldKind::Items => "TEXT",
            };
            columns.push(format!("{} {}", field.name, sql_type));
        }
        columns.push("created_at TEXT NOT NULL".to_string());
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {}({})",
                spec.table,
                columns.join(", ")
            ),
            [],
        )?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_created ON {}(created_at)",
                spec.table, spec.table
            ),
            [],
        )?;
    }

    // Key/value stores: login flags and site settings (maintenance mode).
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pengaturan(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn kv_get(conn: &Connection, table: &str, key: &str) -> anyhow::Result<Option<String>> {
    let sql = format!("SELECT value FROM {} WHERE key = ?", table);
    let value = conn
        .query_row(&sql, [key], |r| r.get::<_, String>(0))
        .optional()?;
    Ok(value)
}

pub fn kv_set(conn: &Connection, table: &str, key: &str, value: &str) -> anyhow::Result<()> {
    let sql = format!(
        "INSERT INTO {}(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        table
    );
    conn.execute(&sql, (key, value))?;
    Ok(())
}

pub fn kv_remove(conn: &Connection, table: &str, key: &str) -> anyhow::Result<()> {
    let sql = format!("DELETE FROM {} WHERE key = ?", table);
    conn.execute(&sql, [key])?;
    Ok(())
}
