use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::directory::DEFAULT_BUCKETS;

#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub data_dir: PathBuf,
    pub bucket_count: usize,
    /// `None` means the report heap grows without limit
    pub report_capacity: Option<usize>,
    pub admin_password: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bucket_count: DEFAULT_BUCKETS,
            report_capacity: None,
            admin_password: "admin123".to_string(),
        }
    }
}

impl ClinicConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults on
    /// missing or unusable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("CLINIC_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let bucket_count = match lookup("CLINIC_BUCKETS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %raw, "CLINIC_BUCKETS must be a positive integer, using default");
                    defaults.bucket_count
                }
            },
            None => defaults.bucket_count,
        };

        let report_capacity = lookup("CLINIC_REPORT_CAPACITY").and_then(|raw| {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!(value = %raw, "CLINIC_REPORT_CAPACITY must be a positive integer, report heap left unbounded");
                    None
                }
            }
        });

        let admin_password = lookup("CLINIC_ADMIN_PASSWORD")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                warn!("CLINIC_ADMIN_PASSWORD not set, using default admin password");
                defaults.admin_password
            });

        Self {
            data_dir,
            bucket_count,
            report_capacity,
            admin_password,
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.csv")
    }

    pub fn reservations_path(&self) -> PathBuf {
        self.data_dir.join("reservations.csv")
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.data_dir.join("ratings.csv")
    }
}
