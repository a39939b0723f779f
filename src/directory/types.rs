use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Account role, persisted as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Client,
    Administrator,
    Doctor,
}

impl Role {
    pub fn code(self) -> u8 {
        match self {
            Role::Client => 0,
            Role::Administrator => 1,
            Role::Doctor => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Role> {
        match code {
            0 => Some(Role::Client),
            1 => Some(Role::Administrator),
            2 => Some(Role::Doctor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Administrator => "Admin",
            Role::Doctor => "Doctor",
        }
    }
}

/// A booking between a patient and a doctor.
///
/// `date` is `YYYY-MM-DD` and `time` is `HH:MM`, so plain string comparison
/// orders them chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub date: String,
    pub time: String,
    pub doctor: String,
    pub patient: String,
    pub notes: String,
}

impl Reservation {
    /// Ordering key of the chronological view: date, then time, then doctor
    pub fn chrono_key(&self) -> (&str, &str, &str) {
        (&self.date, &self.time, &self.doctor)
    }

    /// Ordering key of the global report; the doctor does not take part
    pub fn report_key(&self) -> (&str, &str) {
        (&self.date, &self.time)
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub identifier: String,
    pub secret: String,
    pub role: Role,
    /// Only meaningful for doctors
    pub available: bool,
    pub rating_total: u32,
    pub rating_count: u32,
    pub reservations: VecDeque<Reservation>,
}

impl Account {
    pub fn new(identifier: String, secret: String, role: Role) -> Self {
        Self {
            identifier,
            secret,
            role,
            available: role == Role::Doctor,
            rating_total: 0,
            rating_count: 0,
            reservations: VecDeque::new(),
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    /// Average rating, `None` while nobody has rated this account
    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_total as f64 / self.rating_count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctors_start_available_others_do_not() {
        let doc = Account::new("drx".into(), "pw".into(), Role::Doctor);
        let client = Account::new("bob".into(), "pw".into(), Role::Client);
        assert!(doc.available);
        assert!(!client.available);
        assert_eq!(doc.average_rating(), None);
    }

    #[test]
    fn role_codes_match_storage_format() {
        for role in [Role::Client, Role::Administrator, Role::Doctor] {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::from_code(7), None);
    }
}
