//! Birthday notifications — derived per refresh, never persisted.
//!
//! The notification center and the dashboard card both ask for "patients
//! whose birthday falls within the next N days". The answer is computed
//! from the patient roster on every call: there is no stored birthday
//! notification row, and dismissing one only hides it for the current
//! session (it reappears on the next refresh).

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{self, DatabaseError};

/// Synthetic-id prefix. Doubles as the discriminator for session-local
/// dismissal in the notification center.
pub const BIRTHDAY_ID_PREFIX: &str = "birthday-";

/// Lookahead for the live notification badge.
pub const BADGE_LOOKAHEAD_DAYS: i64 = 1;

/// Lookahead for the dashboard birthdays card.
pub const DASHBOARD_LOOKAHEAD_DAYS: i64 = 7;

/// A derived birthday notification. `days_until == 0` means today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdayNotification {
    /// `birthday-<patient-id>`, unique per patient per refresh.
    pub id: String,
    pub patient_id: String,
    pub name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: String,
    pub days_until: i64,
    pub phone: Option<String>,
}

/// Patients whose next birthday falls within `lookahead_days` of `today`,
/// ordered by how soon the birthday is, then by name.
pub fn upcoming_birthdays(
    conn: &Connection,
    today: NaiveDate,
    lookahead_days: i64,
) -> Result<Vec<BirthdayNotification>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, birth_date, phone FROM patients ORDER BY name ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut result = Vec::new();
    for row in rows {
        let (patient_id, name, birth_date, phone) = row?;
        let birth = match db::parse_date(&birth_date) {
            Ok(d) => d,
            Err(_) => {
                // Inserts validate birth dates, so this only fires on rows
                // imported from outside the application.
                tracing::warn!(%patient_id, %birth_date, "skipping unparseable birth date");
                continue;
            }
        };

        let days_until = (next_birthday(birth, today) - today).num_days();
        if days_until <= lookahead_days {
            result.push(BirthdayNotification {
                id: format!("{BIRTHDAY_ID_PREFIX}{patient_id}"),
                patient_id,
                name,
                birth_date,
                days_until,
                phone,
            });
        }
    }

    // Rows arrive name-sorted; a stable sort by days_until keeps the
    // name ordering within each day.
    result.sort_by_key(|b| b.days_until);
    Ok(result)
}

/// Next occurrence of `birth`'s month/day on or after `today`.
/// Feb 29 birthdays are observed on Mar 1 in non-leap years.
fn next_birthday(birth: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = observed(birth, today.year());
    if this_year >= today {
        this_year
    } else {
        observed(birth, today.year() + 1)
    }
}

fn observed(birth: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 3, 1).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn insert_patient(conn: &Connection, id: &str, name: &str, birth: &str, phone: Option<&str>) {
        conn.execute(
            "INSERT INTO patients (id, name, birth_date, phone) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, name, birth, phone],
        )
        .unwrap();
    }

    #[test]
    fn birthday_today_has_zero_days() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "p1", "Ana", "2018-06-15", Some("5511900000000"));

        let hits = upcoming_birthdays(&conn, date("2026-06-15"), BADGE_LOOKAHEAD_DAYS).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "birthday-p1");
        assert_eq!(hits[0].days_until, 0);
        assert_eq!(hits[0].phone.as_deref(), Some("5511900000000"));
    }

    #[test]
    fn badge_window_is_one_day() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "today", "Ana", "2018-06-15", None);
        insert_patient(&conn, "tomorrow", "Bia", "2019-06-16", None);
        insert_patient(&conn, "later", "Caio", "2020-06-18", None);

        let hits = upcoming_birthdays(&conn, date("2026-06-15"), BADGE_LOOKAHEAD_DAYS).unwrap();
        let ids: Vec<&str> = hits.iter().map(|b| b.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["today", "tomorrow"]);
    }

    #[test]
    fn dashboard_window_is_wider() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "p1", "Ana", "2018-06-20", None);

        let badge = upcoming_birthdays(&conn, date("2026-06-15"), BADGE_LOOKAHEAD_DAYS).unwrap();
        assert!(badge.is_empty());

        let card =
            upcoming_birthdays(&conn, date("2026-06-15"), DASHBOARD_LOOKAHEAD_DAYS).unwrap();
        assert_eq!(card.len(), 1);
        assert_eq!(card[0].days_until, 5);
    }

    #[test]
    fn ordered_by_days_then_name() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "b", "Bia", "2019-06-15", None);
        insert_patient(&conn, "a", "Ana", "2018-06-16", None);
        insert_patient(&conn, "c", "Caio", "2020-06-15", None);

        let hits = upcoming_birthdays(&conn, date("2026-06-15"), 7).unwrap();
        let names: Vec<&str> = hits.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Bia", "Caio", "Ana"]);
    }

    #[test]
    fn year_wrap_counts_forward() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "p1", "Ana", "2018-01-02", None);

        // Dec 30 → Jan 2 is 3 days away, across the year boundary.
        let hits = upcoming_birthdays(&conn, date("2025-12-30"), 7).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].days_until, 3);
    }

    #[test]
    fn feb_29_observed_mar_1_off_leap_years() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "p1", "Ana", "2020-02-29", None);

        // 2026 is not a leap year: observed Mar 1.
        let hits = upcoming_birthdays(&conn, date("2026-03-01"), 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].days_until, 0);

        // 2028 is a leap year: observed Feb 29.
        let hits = upcoming_birthdays(&conn, date("2028-02-29"), 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].days_until, 0);
    }

    #[test]
    fn unparseable_birth_date_is_skipped() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, "bad", "Ana", "not-a-date", None);
        insert_patient(&conn, "good", "Bia", "2019-06-15", None);

        let hits = upcoming_birthdays(&conn, date("2026-06-15"), 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].patient_id, "good");
    }

    #[test]
    fn empty_roster_yields_nothing() {
        let conn = open_memory_database().unwrap();
        let hits = upcoming_birthdays(&conn, date("2026-06-15"), 7).unwrap();
        assert!(hits.is_empty());
    }
}
