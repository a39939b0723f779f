use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tracing::{debug, info};

use crate::directory::{Account, Reservation};
use crate::error::StoreError;

pub const USERS_HEADER: [&str; 3] = ["username", "password", "role"];
pub const RESERVATIONS_HEADER: [&str; 5] = ["username", "date", "time", "doctor", "notes"];
pub const RATINGS_HEADER: [&str; 2] = ["doctor", "rating"];

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Appends one row, writing `header` first when the file is new or empty
fn append_row(path: &Path, header: &[&str], row: &[&str]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        wtr.write_record(header)?;
    }
    wtr.write_record(row)?;
    wtr.flush()?;
    Ok(())
}

/// Rewrites a whole file through a sibling temp file so a failed write never
/// leaves it half written
fn rewrite<F>(path: &Path, header: &[&str], write_rows: F) -> Result<usize, StoreError>
where
    F: FnOnce(&mut csv::Writer<File>) -> Result<usize, StoreError>,
{
    ensure_parent(path)?;
    let tmp = path.with_extension("csv.tmp");
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(&tmp)?;
    wtr.write_record(header)?;
    let rows = write_rows(&mut wtr)?;
    wtr.flush()?;
    drop(wtr);
    fs::rename(&tmp, path)?;
    Ok(rows)
}

/// Appends a newly registered account
pub fn append_account(path: &Path, account: &Account) -> Result<(), StoreError> {
    let role = account.role.code().to_string();
    append_row(
        path,
        &USERS_HEADER,
        &[account.identifier.as_str(), account.secret.as_str(), role.as_str()],
    )?;
    debug!(identifier = %account.identifier, "account appended");
    Ok(())
}

/// Rewrites the account file from the directory's current contents
pub fn save_accounts<'a, I>(path: &Path, accounts: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Account>,
{
    let rows = rewrite(path, &USERS_HEADER, |wtr| {
        let mut rows = 0;
        for account in accounts {
            let role = account.role.code().to_string();
            wtr.write_record([account.identifier.as_str(), account.secret.as_str(), role.as_str()])?;
            rows += 1;
        }
        Ok(rows)
    })?;
    info!(path = %path.display(), rows, "accounts saved");
    Ok(rows)
}

/// Rewrites every account's reservation queue
pub fn save_reservations<'a, I>(path: &Path, accounts: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Account>,
{
    let rows = rewrite(path, &RESERVATIONS_HEADER, |wtr| {
        let mut rows = 0;
        for account in accounts {
            for r in &account.reservations {
                wtr.write_record([
                    account.identifier.as_str(),
                    r.date.as_str(),
                    r.time.as_str(),
                    r.doctor.as_str(),
                    r.notes.as_str(),
                ])?;
                rows += 1;
            }
        }
        Ok(rows)
    })?;
    info!(path = %path.display(), rows, "reservations saved");
    Ok(rows)
}

pub fn append_rating(path: &Path, doctor: &str, rating: u8) -> Result<(), StoreError> {
    let rating = rating.to_string();
    append_row(path, &RATINGS_HEADER, &[doctor, rating.as_str()])?;
    debug!(doctor, "rating appended");
    Ok(())
}

/// Writes the report as pretty JSON
pub fn write_report_json<W: Write>(out: W, report: &[&Reservation]) -> Result<(), StoreError> {
    serde_json::to_writer_pretty(out, report)?;
    Ok(())
}
