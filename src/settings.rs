//! Site settings — a small key-value store for public-site content.
//!
//! Values are opaque strings; the typed `SeoConfig` helper groups the
//! well-known SEO keys so the admin UI can edit them as one unit.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

const KEY_SITE_TITLE: &str = "seo.site_title";
const KEY_SITE_DESCRIPTION: &str = "seo.site_description";
const KEY_KEYWORDS: &str = "seo.keywords";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: Option<String>,
}

/// The SEO keys as one editable unit. Missing keys come back empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoConfig {
    pub site_title: String,
    pub site_description: String,
    pub keywords: String,
}

// ─── Repository functions ─────────────────────────────────────────────────────

/// Inserts or replaces one setting, stamping `updated_at` on replace.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO site_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                        updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    conn.query_row(
        "SELECT value FROM site_settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn delete_setting(conn: &Connection, key: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM site_settings WHERE key = ?1", params![key])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Setting".into(),
            id: key.into(),
        });
    }
    Ok(())
}

pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT key, value, updated_at FROM site_settings ORDER BY key ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
            updated_at: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

impl SeoConfig {
    pub fn load(conn: &Connection) -> Result<Self, DatabaseError> {
        Ok(Self {
            site_title: get_setting(conn, KEY_SITE_TITLE)?.unwrap_or_default(),
            site_description: get_setting(conn, KEY_SITE_DESCRIPTION)?.unwrap_or_default(),
            keywords: get_setting(conn, KEY_KEYWORDS)?.unwrap_or_default(),
        })
    }

    pub fn save(&self, conn: &Connection) -> Result<(), DatabaseError> {
        set_setting(conn, KEY_SITE_TITLE, &self.site_title)?;
        set_setting(conn, KEY_SITE_DESCRIPTION, &self.site_description)?;
        set_setting(conn, KEY_KEYWORDS, &self.keywords)?;
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn set_then_get() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "homepage.banner", "Bem-vindos!").unwrap();
        assert_eq!(
            get_setting(&conn, "homepage.banner").unwrap().as_deref(),
            Some("Bem-vindos!")
        );
        assert_eq!(get_setting(&conn, "missing").unwrap(), None);
    }

    #[test]
    fn set_is_upsert_and_stamps() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "k", "one").unwrap();
        set_setting(&conn, "k", "two").unwrap();

        let all = list_settings(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "two");
        assert!(all[0].updated_at.is_some());
    }

    #[test]
    fn list_is_key_ordered() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "b", "2").unwrap();
        set_setting(&conn, "a", "1").unwrap();

        let keys: Vec<String> = list_settings(&conn).unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_setting(&conn, "nope").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn seo_roundtrip_and_defaults() {
        let conn = open_memory_database().unwrap();
        assert_eq!(SeoConfig::load(&conn).unwrap(), SeoConfig::default());

        let seo = SeoConfig {
            site_title: "Sorriso Kids".into(),
            site_description: "Odontopediatria com carinho".into(),
            keywords: "dentista, infantil".into(),
        };
        seo.save(&conn).unwrap();
        assert_eq!(SeoConfig::load(&conn).unwrap(), seo);
    }
}
