//! Sorriso — admin backend for a pediatric dental practice.
//!
//! The core is the notification center: return-visit reminders, derived
//! birthday notifications and staff-authored notices merged into one list
//! with a badge count, refreshed every five minutes. Around it: patient
//! records, appointment scheduling, intake forms from the public site and
//! a small site-settings store, all on a local SQLite database behind an
//! axum HTTP API.

pub mod api;
pub mod appointments;
pub mod birthdays;
pub mod config;
pub mod db;
pub mod intake;
pub mod manual;
pub mod messages;
pub mod notifications;
pub mod patients;
pub mod reminders;
pub mod settings;
pub mod state;
