use std::collections::VecDeque;

use tracing::{debug, info};

use crate::config::ClinicConfig;
use crate::directory::{Account, AccountDirectory, IdentifierTrie, Reservation, Role};
use crate::error::{ClinicError, NotFoundKind};
use crate::ordering::{ChronoOrderedView, ReportHeap};
use crate::validation::{
    normalize_identifier, validate_date, validate_rating, validate_registration, validate_time,
};

pub const DEFAULT_DOCTOR: &str = "DokterDOom";
pub const DEFAULT_DOCTOR_PASSWORD: &str = "kamartaj";
pub const DEFAULT_ADMIN: &str = "admin";

/// The logged-in account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identifier: String,
    pub role: Role,
}

/// A doctor known to the trie. `account` is `None` when the identifier no
/// longer resolves to a doctor in the directory.
#[derive(Debug, Clone, Copy)]
pub struct DoctorListing<'a> {
    pub identifier: &'a str,
    pub account: Option<&'a Account>,
}

impl DoctorListing<'_> {
    pub fn is_stale(&self) -> bool {
        self.account.is_none()
    }
}

/// Account directory plus the doctor index kept in step with it.
#[derive(Debug, Default)]
pub struct Clinic {
    directory: AccountDirectory,
    doctors: IdentifierTrie,
    report_capacity: Option<usize>,
}

impl Clinic {
    pub fn new(directory: AccountDirectory, doctors: IdentifierTrie) -> Self {
        Self {
            directory,
            doctors,
            report_capacity: None,
        }
    }

    pub fn from_config(config: &ClinicConfig) -> Self {
        Self {
            directory: AccountDirectory::new(config.bucket_count),
            doctors: IdentifierTrie::new(),
            report_capacity: config.report_capacity,
        }
    }

    pub fn with_report_capacity(mut self, capacity: Option<usize>) -> Self {
        self.report_capacity = capacity;
        self
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn doctors(&self) -> &IdentifierTrie {
        &self.doctors
    }

    /// Inserts an account of any role; doctors are also indexed in the trie
    pub fn register_account(&mut self, identifier: &str, secret: &str, role: Role) -> Result<String, ClinicError> {
        let identifier = validate_registration(identifier, secret)?;
        self.directory.insert(&identifier, secret, role)?;
        if role == Role::Doctor {
            self.doctors.insert(&identifier);
        }
        info!(identifier = %identifier, role = role.label(), "account registered");
        Ok(identifier)
    }

    pub fn register_client(&mut self, identifier: &str, secret: &str) -> Result<String, ClinicError> {
        self.register_account(identifier, secret, Role::Client)
    }

    /// Creates the default administrator and doctor when they are missing
    pub fn bootstrap(&mut self, admin_password: &str) {
        let defaults = [
            (DEFAULT_ADMIN, admin_password, Role::Administrator),
            (DEFAULT_DOCTOR, DEFAULT_DOCTOR_PASSWORD, Role::Doctor),
        ];
        for (identifier, secret, role) in defaults {
            match self.register_account(identifier, secret, role) {
                Ok(_) => {}
                Err(ClinicError::DuplicateIdentifier(_)) => {
                    // loaded from disk; make sure a stored doctor is indexed
                    let stored = identifier.to_lowercase();
                    if self.directory.find(&stored).is_some_and(Account::is_doctor) {
                        self.doctors.insert(&stored);
                    }
                }
                Err(e) => debug!(identifier, error = %e, "bootstrap account skipped"),
            }
        }
    }

    pub fn login(&self, identifier: &str, secret: &str) -> Result<Session, ClinicError> {
        let identifier = normalize_identifier(identifier)?;
        match self.directory.find(&identifier) {
            Some(account) if account.secret == secret => {
                info!(identifier = %identifier, role = account.role.label(), "login");
                Ok(Session {
                    identifier,
                    role: account.role,
                })
            }
            _ => Err(ClinicError::account_not_found(identifier)),
        }
    }

    fn account(&self, identifier: &str) -> Result<&Account, ClinicError> {
        self.directory
            .find(identifier)
            .ok_or_else(|| ClinicError::account_not_found(identifier))
    }

    fn doctor(&self, identifier: &str) -> Result<&Account, ClinicError> {
        self.directory
            .find(identifier)
            .filter(|account| account.is_doctor())
            .ok_or_else(|| ClinicError::doctor_not_found(identifier))
    }

    /// The normalised identifier of a doctor who currently takes bookings
    pub fn bookable_doctor(&self, doctor: &str) -> Result<String, ClinicError> {
        let doctor = normalize_identifier(doctor)?;
        if !self.doctor(&doctor)?.available {
            return Err(ClinicError::Unavailable(doctor));
        }
        Ok(doctor)
    }

    /// Books a reservation; returns its 1-based position in the patient's queue
    pub fn book(
        &mut self,
        patient: &str,
        doctor: &str,
        date: &str,
        time: &str,
        notes: &str,
    ) -> Result<usize, ClinicError> {
        let patient = normalize_identifier(patient)?;
        self.account(&patient)?;
        let doctor = self.bookable_doctor(doctor)?;
        let date = validate_date(date)?;
        let time = validate_time(time)?;

        let reservation = Reservation {
            date,
            time,
            doctor,
            patient: patient.clone(),
            notes: notes.trim().to_string(),
        };
        let queue = &mut self
            .directory
            .find_mut(&patient)
            .ok_or_else(|| ClinicError::account_not_found(patient.as_str()))?
            .reservations;
        info!(
            patient = %patient,
            doctor = %reservation.doctor,
            date = %reservation.date,
            time = %reservation.time,
            "reservation created"
        );
        queue.push_back(reservation);
        Ok(queue.len())
    }

    /// Appends an already-validated reservation to its patient's queue
    pub fn attach_reservation(&mut self, reservation: Reservation) -> Result<(), ClinicError> {
        let account = self
            .directory
            .find_mut(&reservation.patient)
            .ok_or_else(|| ClinicError::account_not_found(reservation.patient.clone()))?;
        account.reservations.push_back(reservation);
        Ok(())
    }

    /// The patient's reservations in arrival order
    pub fn reservations(&self, patient: &str) -> Result<&VecDeque<Reservation>, ClinicError> {
        let patient = normalize_identifier(patient)?;
        Ok(&self.account(&patient)?.reservations)
    }

    pub fn personal_schedule(&self, patient: &str) -> Result<ChronoOrderedView<'_>, ClinicError> {
        let patient = normalize_identifier(patient)?;
        let account = self.account(&patient)?;
        Ok(ChronoOrderedView::from_reservations(&account.reservations))
    }

    /// Cancels by 1-based position in arrival order
    pub fn cancel(&mut self, patient: &str, position: usize) -> Result<Reservation, ClinicError> {
        let patient = normalize_identifier(patient)?;
        let account = self
            .directory
            .find_mut(&patient)
            .ok_or_else(|| ClinicError::account_not_found(patient.as_str()))?;
        let removed = position
            .checked_sub(1)
            .and_then(|index| account.reservations.remove(index))
            .ok_or(ClinicError::NotFound(NotFoundKind::Reservation(position)))?;
        info!(patient = %patient, position, date = %removed.date, "reservation cancelled");
        Ok(removed)
    }

    /// Every reservation held with `doctor`, across all patients
    pub fn doctor_schedule(&self, doctor: &str) -> Result<ChronoOrderedView<'_>, ClinicError> {
        let doctor = normalize_identifier(doctor)?;
        self.doctor(&doctor)?;
        let matching = self
            .directory
            .iter()
            .flat_map(|account| account.reservations.iter())
            .filter(|reservation| reservation.doctor == doctor);
        Ok(ChronoOrderedView::from_reservations(matching))
    }

    /// Flips a doctor's availability and returns the new state
    pub fn toggle_availability(&mut self, doctor: &str) -> Result<bool, ClinicError> {
        let doctor = normalize_identifier(doctor)?;
        let account = self
            .directory
            .find_mut(&doctor)
            .filter(|account| account.is_doctor())
            .ok_or_else(|| ClinicError::doctor_not_found(doctor.as_str()))?;
        account.available = !account.available;
        info!(doctor = %doctor, available = account.available, "availability toggled");
        Ok(account.available)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> + '_ {
        self.directory.iter()
    }

    /// Removes an account and its reservations. A deleted doctor stays in the
    /// trie and shows up as stale.
    pub fn delete_account(&mut self, identifier: &str) -> Result<Account, ClinicError> {
        let identifier = normalize_identifier(identifier)?;
        let account = self.directory.delete(&identifier)?;
        info!(
            identifier = %identifier,
            released = account.reservations.len(),
            "account deleted"
        );
        Ok(account)
    }

    fn listing<'a>(&'a self, identifier: &'a str) -> DoctorListing<'a> {
        DoctorListing {
            identifier,
            account: self.directory.find(identifier).filter(|a| a.is_doctor()),
        }
    }

    /// All indexed doctors in alphabetical order
    pub fn list_doctors(&self) -> Vec<DoctorListing<'_>> {
        self.doctors
            .identifiers()
            .into_iter()
            .map(|id| self.listing(id))
            .collect()
    }

    pub fn search_doctors(&self, prefix: &str) -> Vec<DoctorListing<'_>> {
        self.doctors
            .suggestions(prefix.trim())
            .into_iter()
            .map(|id| self.listing(id))
            .collect()
    }

    /// Exact trie match first, then a unique prefix match
    pub fn resolve_doctor(&self, query: &str) -> Result<&Account, ClinicError> {
        let query = normalize_identifier(query)?;
        let identifier = match self.doctors.exact_lookup(&query).and_then(|n| n.identifier()) {
            Some(id) => id,
            None => {
                let candidates = self.doctors.suggestions(&query);
                match candidates.as_slice() {
                    [] => return Err(ClinicError::doctor_not_found(query)),
                    [only] => *only,
                    many => {
                        return Err(ClinicError::AmbiguousDoctor(
                            many.iter().map(|s| s.to_string()).collect(),
                        ))
                    }
                }
            }
        };
        self.doctor(identifier)
    }

    /// Rates the doctor `query` resolves to; returns the doctor's identifier
    pub fn rate_doctor(&mut self, query: &str, rating: i64) -> Result<String, ClinicError> {
        let identifier = self.resolve_doctor(query)?.identifier.clone();
        let rating = validate_rating(rating)?;
        self.record_rating(&identifier, rating)?;
        Ok(identifier)
    }

    /// Adds a rating to a doctor found by exact identifier
    pub fn record_rating(&mut self, doctor: &str, rating: u8) -> Result<(), ClinicError> {
        let doctor = normalize_identifier(doctor)?;
        let rating = validate_rating(i64::from(rating))?;
        let account = self
            .directory
            .find_mut(&doctor)
            .filter(|account| account.is_doctor())
            .ok_or_else(|| ClinicError::doctor_not_found(doctor.as_str()))?;
        account.rating_total += u32::from(rating);
        account.rating_count += 1;
        info!(doctor = %doctor, rating, count = account.rating_count, "rating recorded");
        Ok(())
    }

    /// Every reservation in the system, earliest first
    pub fn report(&self) -> Result<Vec<&Reservation>, ClinicError> {
        let mut heap = match self.report_capacity {
            Some(limit) => ReportHeap::bounded(limit),
            None => ReportHeap::new(),
        };
        for reservation in self.directory.iter().flat_map(|a| a.reservations.iter()) {
            heap.insert(reservation)?;
        }
        debug!(count = heap.len(), "report heap built");
        Ok(heap.drain_sorted().collect())
    }
}
