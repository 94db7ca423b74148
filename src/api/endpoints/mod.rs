pub mod appointments;
pub mod health;
pub mod intake;
pub mod notifications;
pub mod patients;
pub mod reminders;
pub mod settings;
