use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::clinic::Clinic;
use crate::directory::{Reservation, Role};
use crate::error::StoreError;
use crate::validation::{validate_date, validate_time};

/// Counts of what a load pass accepted and skipped
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

fn open(path: &Path) -> Result<Option<csv::Reader<std::fs::File>>, StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "no data file yet");
        return Ok(None);
    }
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(Some(reader))
}

/// Finds a named column, failing when the header lacks it
fn column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize, StoreError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| StoreError::Malformed {
            file: path.display().to_string(),
            line: 1,
            reason: format!("missing '{}' column", name),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Loads `username,password,role` rows into the directory (and the trie for doctors)
pub fn load_accounts(clinic: &mut Clinic, path: &Path) -> Result<LoadSummary, StoreError> {
    let mut summary = LoadSummary::default();
    let Some(mut reader) = open(path)? else {
        return Ok(summary);
    };

    let headers = reader.headers()?.clone();
    let user_col = column(&headers, "username", path)?;
    let pass_col = column(&headers, "password", path)?;
    let role_col = column(&headers, "role", path)?;

    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);

        let (Some(username), Some(password), Some(role)) =
            (record.get(user_col), record.get(pass_col), record.get(role_col))
        else {
            warn!(line, "account row has too few columns, skipped");
            summary.skipped += 1;
            continue;
        };

        let Some(role) = role.parse::<u8>().ok().and_then(Role::from_code) else {
            warn!(line, role, "unknown role code, skipped");
            summary.skipped += 1;
            continue;
        };

        match clinic.register_account(username, password, role) {
            Ok(_) => summary.loaded += 1,
            Err(e) => {
                warn!(line, username, error = %e, "account row rejected");
                summary.skipped += 1;
            }
        }
    }

    info!(path = %path.display(), loaded = summary.loaded, skipped = summary.skipped, "accounts loaded");
    Ok(summary)
}

/// Loads `username,date,time,doctor,notes` rows onto their patients' queues
pub fn load_reservations(clinic: &mut Clinic, path: &Path) -> Result<LoadSummary, StoreError> {
    let mut summary = LoadSummary::default();
    let Some(mut reader) = open(path)? else {
        return Ok(summary);
    };

    let headers = reader.headers()?.clone();
    let user_col = column(&headers, "username", path)?;
    let date_col = column(&headers, "date", path)?;
    let time_col = column(&headers, "time", path)?;
    let doctor_col = column(&headers, "doctor", path)?;
    // notes may be absent in hand-written files
    let notes_col = headers.iter().position(|h| h.eq_ignore_ascii_case("notes"));

    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);

        let (Some(patient), Some(date), Some(time), Some(doctor)) = (
            record.get(user_col),
            record.get(date_col),
            record.get(time_col),
            record.get(doctor_col),
        ) else {
            warn!(line, "reservation row has too few columns, skipped");
            summary.skipped += 1;
            continue;
        };

        // stored dates and times must keep their sortable padded form
        let checked = validate_date(date).and_then(|date| validate_time(time).map(|time| (date, time)));
        let (date, time) = match checked {
            Ok(pair) => pair,
            Err(e) => {
                warn!(line, patient, error = %e, "reservation row has a bad date or time, skipped");
                summary.skipped += 1;
                continue;
            }
        };

        let reservation = Reservation {
            date,
            time,
            doctor: doctor.to_lowercase(),
            patient: patient.to_lowercase(),
            notes: notes_col
                .and_then(|c| record.get(c))
                .unwrap_or("")
                .to_string(),
        };

        match clinic.attach_reservation(reservation) {
            Ok(()) => summary.loaded += 1,
            Err(_) => {
                debug!(line, patient, "reservation for unknown patient, skipped");
                summary.skipped += 1;
            }
        }
    }

    info!(path = %path.display(), loaded = summary.loaded, skipped = summary.skipped, "reservations loaded");
    Ok(summary)
}

/// Replays `doctor,rating` rows into the doctors' accumulators
pub fn load_ratings(clinic: &mut Clinic, path: &Path) -> Result<LoadSummary, StoreError> {
    let mut summary = LoadSummary::default();
    let Some(mut reader) = open(path)? else {
        return Ok(summary);
    };

    let headers = reader.headers()?.clone();
    let doctor_col = column(&headers, "doctor", path)?;
    let rating_col = column(&headers, "rating", path)?;

    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);

        let parsed = record
            .get(doctor_col)
            .zip(record.get(rating_col).and_then(|r| r.parse::<u8>().ok()));
        let Some((doctor, rating)) = parsed else {
            warn!(line, "rating row unreadable, skipped");
            summary.skipped += 1;
            continue;
        };

        match clinic.record_rating(&doctor.to_lowercase(), rating) {
            Ok(()) => summary.loaded += 1,
            Err(e) => {
                warn!(line, doctor, error = %e, "rating row rejected");
                summary.skipped += 1;
            }
        }
    }

    info!(path = %path.display(), loaded = summary.loaded, skipped = summary.skipped, "ratings loaded");
    Ok(summary)
}
