use rusqlite::{Connection, OptionalExtension};

use crate::models::{Entity, TableStatus};

pub const MEDIA_DIRECTORY_SETTING: &str = "MEDIA_DIRECTORY";

/// Row count of `entity` over every tree in the database.
pub fn count_rows(conn: &Connection, prefix: &str, entity: Entity) -> rusqlite::Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM \"{}{}\"", prefix, entity.table_suffix());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// Data and index bytes per table, read from the `dbstat` virtual table.
/// Pages of an index are charged to the table the index belongs to.
pub fn table_status(conn: &Connection) -> rusqlite::Result<Vec<TableStatus>> {
    let mut stmt = conn.prepare(
        "SELECT m.tbl_name,
                SUM(CASE WHEN m.type = 'table' THEN s.pgsize ELSE 0 END) AS data_length,
                SUM(CASE WHEN m.type = 'index' THEN s.pgsize ELSE 0 END) AS index_length
         FROM dbstat AS s
         JOIN sqlite_master AS m ON m.name = s.name
         GROUP BY m.tbl_name
         ORDER BY m.tbl_name",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let data_length: Option<i64> = row.get(1)?;
            let index_length: Option<i64> = row.get(2)?;
            Ok(TableStatus {
                name: row.get(0)?,
                data_length: data_length.and_then(|v| u64::try_from(v).ok()),
                index_length: index_length.and_then(|v| u64::try_from(v).ok()),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// The `MEDIA_DIRECTORY` preference of `tree`, or of the lowest-numbered tree
/// when none is given.
pub fn media_directory_setting(
    conn: &Connection,
    prefix: &str,
    tree: Option<i64>,
) -> rusqlite::Result<Option<String>> {
    let sql = format!(
        "SELECT setting_value FROM \"{prefix}gedcom_setting\"
         WHERE setting_name = ?1 AND (?2 IS NULL OR gedcom_id = ?2)
         ORDER BY gedcom_id
         LIMIT 1"
    );
    conn.query_row(&sql, rusqlite::params![MEDIA_DIRECTORY_SETTING, tree], |row| row.get(0))
        .optional()
}
