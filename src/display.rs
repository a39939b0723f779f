use std::fmt::Write;

use crate::clinic::DoctorListing;
use crate::directory::{Account, Reservation};
use crate::ordering::ChronoEntry;

pub const NO_RESERVATIONS: &str = "No reservations found.";
pub const NO_RATINGS: &str = "no ratings";
pub const STALE_DOCTOR: &str = "doctor not found in system";

pub fn format_average(account: &Account) -> String {
    match account.average_rating() {
        Some(avg) => format!("{:.1} ({} ratings)", avg, account.rating_count),
        None => NO_RATINGS.to_string(),
    }
}

/// One reservation as a block of labelled lines
pub fn format_reservation(reservation: &Reservation, patient: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(patient) = patient {
        let _ = writeln!(out, "Patient: {}", patient);
    }
    let _ = writeln!(out, "Date   : {}", reservation.date);
    let _ = writeln!(out, "Time   : {}", reservation.time);
    let _ = writeln!(out, "Doctor : {}", reservation.doctor);
    let _ = writeln!(out, "Notes  : {}", reservation.notes);
    out
}

/// Numbered reservations in arrival order, the numbering cancellation uses
pub fn format_numbered<'a, I>(reservations: I) -> String
where
    I: IntoIterator<Item = &'a Reservation>,
{
    let mut out = String::new();
    for (i, reservation) in reservations.into_iter().enumerate() {
        let _ = writeln!(out, "Reservation #{}:", i + 1);
        out.push_str(&format_reservation(reservation, None));
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str(NO_RESERVATIONS);
        out.push('\n');
    }
    out
}

/// A chronological view, patient shown when the view carries it
pub fn format_schedule<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = ChronoEntry<'a>>,
{
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format_reservation(entry.reservation, entry.patient));
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str(NO_RESERVATIONS);
        out.push('\n');
    }
    out
}

/// The global report: one line per reservation
pub fn format_report(report: &[&Reservation]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total reservations: {}", report.len());
    for r in report {
        let _ = writeln!(
            out,
            "{} {} | Patient: {} | Doctor: {} | Notes: {}",
            r.date, r.time, r.patient, r.doctor, r.notes
        );
    }
    out
}

pub fn format_users<'a, I>(accounts: I) -> String
where
    I: IntoIterator<Item = &'a Account>,
{
    let mut out = String::new();
    for account in accounts {
        let _ = writeln!(out, "Username: {} | Role: {}", account.identifier, account.role.label());
    }
    out
}

pub fn format_doctor_listing(listing: &DoctorListing<'_>) -> String {
    match listing.account {
        Some(account) => format!(
            "{} | {} | Rating: {}",
            listing.identifier,
            if account.available { "Available" } else { "Unavailable" },
            format_average(account)
        ),
        None => format!("{} | {}", listing.identifier, STALE_DOCTOR),
    }
}

pub fn format_doctor_list(listings: &[DoctorListing<'_>]) -> String {
    if listings.is_empty() {
        return "No doctors found.\n".to_string();
    }
    listings
        .iter()
        .map(|l| format_doctor_listing(l) + "\n")
        .collect()
}

pub fn format_rating_summary(listings: &[DoctorListing<'_>]) -> String {
    let mut out = String::new();
    for listing in listings {
        match listing.account {
            Some(account) => {
                let _ = writeln!(out, "{}: {}", listing.identifier, format_average(account));
            }
            None => {
                let _ = writeln!(out, "{}: {}", listing.identifier, STALE_DOCTOR);
            }
        }
    }
    if out.is_empty() {
        out.push_str("No doctors registered.\n");
    }
    out
}
