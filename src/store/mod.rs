pub mod load;
pub mod export;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::clinic::Clinic;
use crate::config::ClinicConfig;
use crate::directory::Account;
use crate::error::StoreError;

pub use load::{load_accounts, load_ratings, load_reservations, LoadSummary};
pub use export::{
    append_account, append_rating, save_accounts, save_reservations, write_report_json,
};

/// The three CSV files backing a clinic
#[derive(Debug, Clone)]
pub struct CsvStore {
    users: PathBuf,
    reservations: PathBuf,
    ratings: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            users: data_dir.join("users.csv"),
            reservations: data_dir.join("reservations.csv"),
            ratings: data_dir.join("ratings.csv"),
        }
    }

    pub fn from_config(config: &ClinicConfig) -> Self {
        Self {
            users: config.users_path(),
            reservations: config.reservations_path(),
            ratings: config.ratings_path(),
        }
    }

    /// Accounts first, then reservations and ratings which refer to them
    pub fn load_into(&self, clinic: &mut Clinic) -> Result<(), StoreError> {
        let accounts = load_accounts(clinic, &self.users)?;
        let reservations = load_reservations(clinic, &self.reservations)?;
        let ratings = load_ratings(clinic, &self.ratings)?;
        info!(
            accounts = accounts.loaded,
            reservations = reservations.loaded,
            ratings = ratings.loaded,
            "clinic data loaded"
        );
        Ok(())
    }

    pub fn account_registered(&self, account: &Account) -> Result<(), StoreError> {
        append_account(&self.users, account)
    }

    pub fn accounts_changed(&self, clinic: &Clinic) -> Result<(), StoreError> {
        save_accounts(&self.users, clinic.accounts()).map(|_| ())
    }

    pub fn reservations_changed(&self, clinic: &Clinic) -> Result<(), StoreError> {
        save_reservations(&self.reservations, clinic.accounts()).map(|_| ())
    }

    pub fn rating_recorded(&self, doctor: &str, rating: u8) -> Result<(), StoreError> {
        append_rating(&self.ratings, doctor, rating)
    }
}
