use anyhow::Result;
use rusqlite::Connection;

/// Creates the host tables this module reads from. The host application owns
/// them in production; this exists for local setups and tests.
pub fn create_tables(conn: &Connection, prefix: &str) -> Result<()> {
    // Trees
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {prefix}gedcom (
                gedcom_id INTEGER PRIMARY KEY AUTOINCREMENT,
                gedcom_name TEXT NOT NULL UNIQUE,
                sort_order INTEGER NOT NULL DEFAULT 0
            )"
        ),
        [],
    )?;

    // Per-tree preferences, MEDIA_DIRECTORY among them
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {prefix}gedcom_setting (
                gedcom_id INTEGER NOT NULL,
                setting_name TEXT NOT NULL,
                setting_value TEXT NOT NULL,
                PRIMARY KEY (gedcom_id, setting_name),
                FOREIGN KEY (gedcom_id) REFERENCES {prefix}gedcom(gedcom_id)
            )"
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {prefix}individuals (
                i_id TEXT NOT NULL,
                i_file INTEGER NOT NULL,
                i_rin TEXT NOT NULL DEFAULT '',
                i_sex TEXT NOT NULL DEFAULT 'U',
                i_gedcom TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (i_id, i_file),
                FOREIGN KEY (i_file) REFERENCES {prefix}gedcom(gedcom_id)
            )"
        ),
        [],
    )?;
    conn.execute(
        &format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}individuals_file \
             ON {prefix}individuals(i_file)"
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {prefix}media (
                m_id TEXT NOT NULL,
                m_file INTEGER NOT NULL,
                m_filename TEXT NOT NULL DEFAULT '',
                m_titl TEXT NOT NULL DEFAULT '',
                m_gedcom TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (m_id, m_file),
                FOREIGN KEY (m_file) REFERENCES {prefix}gedcom(gedcom_id)
            )"
        ),
        [],
    )?;
    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{prefix}media_file ON {prefix}media(m_file)"),
        [],
    )?;

    Ok(())
}
