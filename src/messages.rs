//! Message templating — pure string formatters, no I/O.
//!
//! Reminder and birthday texts are assembled here and handed to the
//! WhatsApp deep link. Templates carry `{{nome}}` and `{{data}}`
//! placeholders; dates render in Brazilian `dd/mm/yyyy` form.

use chrono::NaiveDate;

/// Default return-visit message when the reminder has no custom template.
pub const DEFAULT_RETURN_TEMPLATE: &str =
    "Olá {{nome}}! Está chegando a hora do seu retorno ao dentista. \
     Podemos agendar sua consulta para o dia {{data}}?";

/// Formats a calendar date as `dd/mm/yyyy`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Renders the return-visit message for a patient.
///
/// Uses the reminder's custom template when present (blank templates count
/// as absent), otherwise the fixed default. Both substitute `{{nome}}` with
/// the patient's name and `{{data}}` with the localized target date.
pub fn return_message(
    template: Option<&str>,
    patient_name: &str,
    target_date: NaiveDate,
) -> String {
    let template = template
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_RETURN_TEMPLATE);
    template
        .replace("{{nome}}", patient_name)
        .replace("{{data}}", &format_date_br(target_date))
}

/// Renders the birthday message: the "today" variant when the birthday is
/// today (`days_until == 0`), otherwise the "upcoming" variant. Both use
/// the patient's first name.
pub fn birthday_message(patient_name: &str, days_until: i64) -> String {
    let first = first_name(patient_name);
    if days_until == 0 {
        format!(
            "Feliz aniversário, {first}! 🎉 Toda a equipe do consultório \
             deseja um dia cheio de sorrisos!"
        )
    } else {
        format!(
            "O aniversário de {first} está chegando! 🎂 Que tal agendar uma \
             visita para garantir um sorriso saudável na festa?"
        )
    }
}

fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

/// Builds the outbound WhatsApp deep link.
///
/// The phone is reduced to its digits; the message is percent-encoded.
/// No other phone normalization happens here — numbers are opaque strings.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://api.whatsapp.com/send?phone={digits}&text={}",
        urlencoding::encode(message)
    )
}
