//! Notification center — merges three heterogeneous sources into one list.
//!
//! Sources, fetched concurrently on every refresh:
//! 1. persisted return-visit reminders that are due and unsent;
//! 2. birthday notifications derived from the patient roster (1-day
//!    lookahead, never persisted);
//! 3. persisted manual notifications that are due and unsent.
//!
//! The merged list lives in memory behind a lock together with an unread
//! counter (every loaded item counts as unread — there is no separate
//! "read" state, only dismissal). A fixed 5-minute poller re-runs the
//! refresh; refreshes replace the list wholesale, so the policy for
//! overlapping refresh/dismiss races is last-fetch-wins. In particular a
//! dismissed birthday reappears on the next refresh within the same day,
//! since birthday dismissal is session-local.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinError;

use crate::birthdays::{self, BirthdayNotification, BADGE_LOOKAHEAD_DAYS, BIRTHDAY_ID_PREFIX};
use crate::db::{self, DatabaseError};
use crate::manual::{self, ManualNotification};
use crate::reminders::{self, Reminder};

/// Fixed poll interval: 5 minutes, no jitter, no backoff.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(300);

// ─── Notification: closed union of the three kinds ─────────────────────────────

/// One entry in the notification center. Closed sum type with an explicit
/// discriminator; consumers must match exhaustively so a future fourth
/// kind cannot be silently mishandled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Return(Reminder),
    Birthday(BirthdayNotification),
    Manual(ManualNotification),
}

impl Notification {
    pub fn id(&self) -> &str {
        match self {
            Self::Return(r) => &r.id,
            Self::Birthday(b) => &b.id,
            Self::Manual(m) => &m.id,
        }
    }
}

/// Errors from notification center operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Background task failed: {0}")]
    Task(String),
}

// ─── NotificationCenter ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Inner {
    notifications: Vec<Notification>,
    unread: usize,
}

/// In-memory aggregation of the three notification sources.
///
/// Shared via `Arc`; every blocking fetch opens its own connection to the
/// practice database, so refresh sources run truly independently.
pub struct NotificationCenter {
    db_path: PathBuf,
    inner: RwLock<Inner>,
}

/// Which persisted table a dismissal targets.
#[derive(Debug, Clone, Copy)]
enum DismissTarget {
    Reminder,
    Manual,
}

impl NotificationCenter {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Reloads all three sources and replaces the in-memory list.
    ///
    /// The fetches run concurrently with an all-settled join: a failed
    /// source is logged and contributes an empty list, the others still
    /// land. Concatenation order — reminders, then birthdays, then
    /// manual — defines the display order; no cross-source sort.
    /// Never panics or propagates; returns the new unread count.
    pub async fn refresh(&self) -> usize {
        let now = Local::now().naive_local();
        let today = now.date();

        let path = self.db_path.clone();
        let returns = tokio::task::spawn_blocking(move || {
            let conn = db::open_database(&path)?;
            reminders::due_reminders(&conn, now)
        });

        let path = self.db_path.clone();
        let bdays = tokio::task::spawn_blocking(move || {
            let conn = db::open_database(&path)?;
            birthdays::upcoming_birthdays(&conn, today, BADGE_LOOKAHEAD_DAYS)
        });

        let path = self.db_path.clone();
        let manuals = tokio::task::spawn_blocking(move || {
            let conn = db::open_database(&path)?;
            manual::due_manual_notifications(&conn, now)
        });

        let (returns, bdays, manuals) = tokio::join!(returns, bdays, manuals);
        let returns = settle(returns, "reminders");
        let bdays = settle(bdays, "birthdays");
        let manuals = settle(manuals, "manual_notifications");

        let mut list = Vec::with_capacity(returns.len() + bdays.len() + manuals.len());
        list.extend(returns.into_iter().map(Notification::Return));
        list.extend(bdays.into_iter().map(Notification::Birthday));
        list.extend(manuals.into_iter().map(Notification::Manual));
        let count = list.len();

        match self.inner.write() {
            Ok(mut inner) => {
                inner.notifications = list;
                inner.unread = count;
            }
            Err(_) => tracing::error!("notification state lock poisoned, refresh dropped"),
        }
        count
    }

    /// Current list, in display order.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .read()
            .map(|inner| inner.notifications.clone())
            .unwrap_or_default()
    }

    /// Current unread count.
    pub fn unread_count(&self) -> usize {
        self.inner.read().map(|inner| inner.unread).unwrap_or(0)
    }

    /// Dismisses one notification.
    ///
    /// Birthday entries (synthetic `birthday-` ids) are removed from the
    /// in-memory list only — no database write, and the entry reappears on
    /// the next refresh. Persisted kinds update the matching table's
    /// `sent` flag first; on failure the in-memory state is left untouched
    /// and the error propagates. Returns whether the id was present.
    pub async fn dismiss(&self, id: &str) -> Result<bool, NotifyError> {
        if id.starts_with(BIRTHDAY_ID_PREFIX) {
            return Ok(self.remove_local(id)?);
        }

        let target = {
            let inner = self.inner.read().map_err(|_| NotifyError::LockPoisoned)?;
            let Some(found) = inner.notifications.iter().find(|n| n.id() == id) else {
                return Ok(false);
            };
            match found {
                Notification::Return(_) => DismissTarget::Reminder,
                Notification::Manual(_) => DismissTarget::Manual,
                // Birthday ids always carry the prefix; an entry reaching
                // this arm is still dismissed locally only.
                Notification::Birthday(_) => return Ok(self.remove_local(id)?),
            }
        };

        let path = self.db_path.clone();
        let owned_id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db::open_database(&path)?;
            match target {
                DismissTarget::Reminder => reminders::mark_reminder_sent(&conn, &owned_id),
                DismissTarget::Manual => manual::mark_manual_sent(&conn, &owned_id),
            }
        })
        .await
        .map_err(join_error)??;

        Ok(self.remove_local(id)?)
    }

    fn remove_local(&self, id: &str) -> Result<bool, NotifyError> {
        let mut inner = self.inner.write().map_err(|_| NotifyError::LockPoisoned)?;
        let before = inner.notifications.len();
        inner.notifications.retain(|n| n.id() != id);
        let removed = inner.notifications.len() < before;
        if removed {
            inner.unread = inner.unread.saturating_sub(1);
        }
        Ok(removed)
    }
}

fn settle<T>(
    joined: Result<Result<Vec<T>, DatabaseError>, JoinError>,
    source: &'static str,
) -> Vec<T> {
    match joined {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            tracing::error!(source, error = %e, "notification source failed");
            Vec::new()
        }
        Err(e) => {
            tracing::error!(source, error = %e, "notification source task aborted");
            Vec::new()
        }
    }
}

fn join_error(e: JoinError) -> NotifyError {
    NotifyError::Task(e.to_string())
}

/// Starts the periodic refresh loop. The first tick fires immediately
/// (the mount-time load); subsequent ticks every `REFRESH_INTERVAL`.
/// Abort the returned handle on shutdown to stop future ticks — an
/// in-flight refresh is not cancelled.
pub fn spawn_poller(center: Arc<NotificationCenter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let count = center.refresh().await;
            tracing::debug!(count, "notification refresh tick");
        }
    })
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration as ChronoDuration};
    use rusqlite::params;
    use tempfile::TempDir;

    /// File-backed database so the center's per-source connections all see
    /// the same data.
    fn setup() -> (TempDir, Arc<NotificationCenter>) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("sorriso.db");
        db::open_database(&db_path).unwrap();
        (tmp, Arc::new(NotificationCenter::new(db_path)))
    }

    fn conn_for(center: &NotificationCenter) -> rusqlite::Connection {
        db::open_database(&center.db_path).unwrap()
    }

    fn insert_patient(conn: &rusqlite::Connection, id: &str, name: &str, birth: &str) {
        conn.execute(
            "INSERT INTO patients (id, name, birth_date, phone)
             VALUES (?1, ?2, ?3, '5511912345678')",
            params![id, name, birth],
        )
        .unwrap();
    }

    fn insert_due_reminder(conn: &rusqlite::Connection, id: &str, patient_id: &str) {
        conn.execute(
            "INSERT INTO reminders (id, patient_id, target_date, notify_at)
             VALUES (?1, ?2, '2099-01-01', '2020-01-01 09:00:00')",
            params![id, patient_id],
        )
        .unwrap();
    }

    fn insert_due_manual(conn: &rusqlite::Connection, id: &str) {
        conn.execute(
            "INSERT INTO manual_notifications (id, title, message, notify_at)
             VALUES (?1, 'Aviso', 'mensagem de teste', '2020-01-01 09:00:00')",
            params![id],
        )
        .unwrap();
    }

    /// A birth date whose anniversary is today. The leap birth year keeps
    /// the date valid whatever today's month and day are.
    fn birth_date_today() -> String {
        let today = Local::now().date_naive();
        format!("2016-{:02}-{:02}", today.month(), today.day())
    }

    #[tokio::test]
    async fn refresh_merges_three_sources_in_order() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);

        insert_patient(&conn, "p1", "Ana Souza", "2018-01-15");
        insert_patient(&conn, "p2", "Bia Lima", &birth_date_today());
        insert_due_reminder(&conn, "r1", "p1");
        insert_due_reminder(&conn, "r2", "p1");
        insert_due_manual(&conn, "m1");

        let count = center.refresh().await;
        // Two reminders, one manual, Bia's birthday today; p1's Jan 15
        // birthday may add a fifth around mid-January.
        let snapshot = center.snapshot();
        assert_eq!(count, snapshot.len());
        assert_eq!(center.unread_count(), count);
        assert!(count >= 4);

        // Display order: all reminders, then all birthdays, then manual.
        let kinds: Vec<u8> = snapshot
            .iter()
            .map(|n| match n {
                Notification::Return(_) => 0,
                Notification::Birthday(_) => 1,
                Notification::Manual(_) => 2,
            })
            .collect();
        let mut sorted = kinds.clone();
        sorted.sort_unstable();
        assert_eq!(kinds, sorted, "sources must stay grouped in order");

        // Reminders keep their notify_at order at the front.
        assert_eq!(snapshot[0].id(), "r1");
        assert_eq!(snapshot[1].id(), "r2");
        // Manual entry is last.
        assert_eq!(snapshot.last().unwrap().id(), "m1");
    }

    #[tokio::test]
    async fn end_to_end_badge_scenario() {
        // 2 due reminders + 1 birthday today + 1 due manual → 4 items,
        // unread 4; dismissing the birthday → 3 items, unread 3, and no
        // backend write happens for that dismissal.
        let (_tmp, center) = setup();
        let conn = conn_for(&center);

        // Birth dates far from today for the reminder patients.
        let far = Local::now().date_naive() + ChronoDuration::days(100);
        let far_birth = format!("2018-{:02}-{:02}", far.month(), far.day().min(28));
        insert_patient(&conn, "p1", "Ana Souza", &far_birth);
        insert_patient(&conn, "p2", "Bia Lima", &birth_date_today());
        insert_due_reminder(&conn, "r1", "p1");
        insert_due_reminder(&conn, "r2", "p1");
        insert_due_manual(&conn, "m1");

        let count = center.refresh().await;
        assert_eq!(count, 4);
        assert_eq!(center.unread_count(), 4);

        let dismissed = center.dismiss("birthday-p2").await.unwrap();
        assert!(dismissed);
        assert_eq!(center.unread_count(), 3);
        assert_eq!(center.snapshot().len(), 3);

        // No persisted suppression anywhere.
        let sent_rows: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM reminders WHERE sent = 1)
                      + (SELECT COUNT(*) FROM manual_notifications WHERE sent = 1)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(sent_rows, 0);

        // And the birthday resurrects on the next refresh.
        let count = center.refresh().await;
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn dismiss_reminder_updates_reminders_table() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_patient(&conn, "p1", "Ana Souza", "2018-01-15");
        insert_due_reminder(&conn, "r1", "p1");
        insert_due_manual(&conn, "m1");
        center.refresh().await;

        let dismissed = center.dismiss("r1").await.unwrap();
        assert!(dismissed);

        let sent: bool = conn
            .query_row("SELECT sent FROM reminders WHERE id = 'r1'", [], |row| row.get(0))
            .unwrap();
        assert!(sent);

        // The manual table is untouched and the list dropped exactly r1.
        let manual_sent: bool = conn
            .query_row("SELECT sent FROM manual_notifications WHERE id = 'm1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(!manual_sent);
        assert!(center.snapshot().iter().all(|n| n.id() != "r1"));
        assert!(center.snapshot().iter().any(|n| n.id() == "m1"));
    }

    #[tokio::test]
    async fn dismiss_manual_updates_manual_table() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_patient(&conn, "p1", "Ana Souza", "2018-01-15");
        insert_due_reminder(&conn, "r1", "p1");
        insert_due_manual(&conn, "m1");
        center.refresh().await;

        assert!(center.dismiss("m1").await.unwrap());

        let manual_sent: bool = conn
            .query_row("SELECT sent FROM manual_notifications WHERE id = 'm1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(manual_sent);

        let reminder_sent: bool = conn
            .query_row("SELECT sent FROM reminders WHERE id = 'r1'", [], |row| row.get(0))
            .unwrap();
        assert!(!reminder_sent);
    }

    #[tokio::test]
    async fn dismiss_unknown_id_is_noop() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_due_manual(&conn, "m1");
        center.refresh().await;

        assert!(!center.dismiss("ghost").await.unwrap());
        assert_eq!(center.unread_count(), 1);
    }

    #[tokio::test]
    async fn dismiss_absent_birthday_id_reports_false() {
        let (_tmp, center) = setup();
        center.refresh().await;
        assert!(!center.dismiss("birthday-ghost").await.unwrap());
        assert_eq!(center.unread_count(), 0);
    }

    #[tokio::test]
    async fn dismissed_item_does_not_return_before_refresh() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_due_manual(&conn, "m1");
        center.refresh().await;

        assert!(center.dismiss("m1").await.unwrap());
        // Sent flag persisted, so even a refresh keeps it out.
        let count = center.refresh().await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn source_failure_is_isolated() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_patient(&conn, "p1", "Ana Souza", "2018-01-15");
        insert_due_reminder(&conn, "r1", "p1");

        // Break one source: the manual table disappears.
        conn.execute_batch("DROP TABLE manual_notifications").unwrap();

        let count = center.refresh().await;
        assert_eq!(count, 1);
        assert_eq!(center.snapshot()[0].id(), "r1");
    }

    #[tokio::test]
    async fn refresh_replaces_wholesale() {
        let (_tmp, center) = setup();
        let conn = conn_for(&center);
        insert_due_manual(&conn, "m1");
        center.refresh().await;
        assert_eq!(center.unread_count(), 1);

        insert_due_manual(&conn, "m2");
        let count = center.refresh().await;
        // Last fetch wins: the list reflects the store, not prior state.
        assert_eq!(count, 2);
        assert_eq!(center.unread_count(), 2);
    }

    #[test]
    fn notification_serializes_with_kind_tag() {
        let manual = Notification::Manual(ManualNotification {
            id: "m1".into(),
            title: "Aviso".into(),
            message: "mensagem".into(),
            notify_at: "2026-01-10 09:00:00".into(),
            phone: None,
            sent: false,
            created_at: "2026-01-01 09:00:00".into(),
        });
        let json = serde_json::to_value(&manual).unwrap();
        assert_eq!(json["kind"], "manual");

        let bday = Notification::Birthday(BirthdayNotification {
            id: "birthday-p1".into(),
            patient_id: "p1".into(),
            name: "Ana".into(),
            birth_date: "2018-06-15".into(),
            days_until: 0,
            phone: None,
        });
        let json = serde_json::to_value(&bday).unwrap();
        assert_eq!(json["kind"], "birthday");
        assert_eq!(json["id"], "birthday-p1");
    }

    #[tokio::test]
    async fn poller_handle_can_be_aborted() {
        let (_tmp, center) = setup();
        let handle = spawn_poller(Arc::clone(&center));
        // Give the immediate first tick a chance to run.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
