use tracing::debug;

use super::types::{Account, Role};
use crate::error::ClinicError;

pub const DEFAULT_BUCKETS: usize = 100;

/// Index of an account inside the directory's slot arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle(usize);

/// Chained hash table of accounts keyed by identifier.
///
/// Accounts live in an arena of slots; each bucket is an ordered chain of
/// handles into that arena, newest first. Identifiers are compared verbatim,
/// callers normalise them before they get here.
#[derive(Debug)]
pub struct AccountDirectory {
    buckets: Vec<Vec<Handle>>,
    slots: Vec<Option<Account>>,
    free: Vec<usize>,
    len: usize,
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

impl AccountDirectory {
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: vec![Vec::new(); bucket_count],
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Polynomial hash `h = h * 31 + byte`, reduced at every step
    pub fn hash(&self, identifier: &str) -> usize {
        let modulus = self.buckets.len() as u64;
        let h = identifier
            .bytes()
            .fold(0u64, |h, b| (h * 31 + u64::from(b)) % modulus);
        h as usize
    }

    fn locate(&self, identifier: &str) -> Option<(usize, usize, Handle)> {
        let bucket = self.hash(identifier);
        self.buckets[bucket]
            .iter()
            .enumerate()
            .find(|(_, handle)| {
                self.slots[handle.0]
                    .as_ref()
                    .is_some_and(|account| account.identifier == identifier)
            })
            .map(|(pos, handle)| (bucket, pos, *handle))
    }

    /// Creates an account and prepends it to its bucket chain
    pub fn insert(&mut self, identifier: &str, secret: &str, role: Role) -> Result<(), ClinicError> {
        if self.locate(identifier).is_some() {
            return Err(ClinicError::DuplicateIdentifier(identifier.to_string()));
        }

        let account = Account::new(identifier.to_string(), secret.to_string(), role);
        let handle = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(account);
                Handle(index)
            }
            None => {
                self.slots.push(Some(account));
                Handle(self.slots.len() - 1)
            }
        };

        let bucket = self.hash(identifier);
        self.buckets[bucket].insert(0, handle);
        self.len += 1;
        debug!(identifier, bucket, "account inserted");
        Ok(())
    }

    pub fn find(&self, identifier: &str) -> Option<&Account> {
        self.locate(identifier)
            .and_then(|(_, _, handle)| self.slots[handle.0].as_ref())
    }

    pub fn find_mut(&mut self, identifier: &str) -> Option<&mut Account> {
        let (_, _, handle) = self.locate(identifier)?;
        self.slots[handle.0].as_mut()
    }

    /// Unlinks the account from its chain and returns it, reservations included
    pub fn delete(&mut self, identifier: &str) -> Result<Account, ClinicError> {
        let (bucket, pos, handle) = self
            .locate(identifier)
            .ok_or_else(|| ClinicError::account_not_found(identifier))?;

        self.buckets[bucket].remove(pos);
        let account = self.slots[handle.0]
            .take()
            .ok_or_else(|| ClinicError::account_not_found(identifier))?;
        self.free.push(handle.0);
        self.len -= 1;
        debug!(identifier, bucket, released = account.reservations.len(), "account deleted");
        Ok(account)
    }

    /// Every account, bucket by bucket and in chain order within a bucket
    pub fn iter(&self) -> impl Iterator<Item = &Account> + '_ {
        self.buckets
            .iter()
            .flatten()
            .filter_map(move |handle| self.slots[handle.0].as_ref())
    }

    #[cfg(test)]
    fn chain(&self, bucket: usize) -> Vec<&str> {
        self.buckets[bucket]
            .iter()
            .filter_map(|h| self.slots[h.0].as_ref())
            .map(|a| a.identifier.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_reference_values() {
        let dir = AccountDirectory::new(100);
        // 'a' = 97
        assert_eq!(dir.hash("a"), 97);
        // (97 * 31 + 98) % 100 == 5
        assert_eq!(dir.hash("ab"), (97 * 31 + 98) % 100);
        assert_eq!(dir.hash(""), 0);
        assert_eq!(dir.hash("alice"), dir.hash("alice"));
    }

    #[test]
    fn find_after_insert_and_not_after_delete() {
        let mut dir = AccountDirectory::default();
        dir.insert("alice", "pw", Role::Client).unwrap();
        assert_eq!(dir.find("alice").unwrap().secret, "pw");

        let removed = dir.delete("alice").unwrap();
        assert_eq!(removed.identifier, "alice");
        assert!(dir.find("alice").is_none());
        assert!(dir.is_empty());
    }

    #[test]
    fn duplicate_insert_is_rejected_and_leaves_original() {
        let mut dir = AccountDirectory::default();
        dir.insert("bob", "first", Role::Client).unwrap();
        let err = dir.insert("bob", "second", Role::Doctor).unwrap_err();
        assert_eq!(err, ClinicError::DuplicateIdentifier("bob".into()));
        assert_eq!(dir.find("bob").unwrap().secret, "first");
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn lookup_is_case_sensitive_at_this_layer() {
        let mut dir = AccountDirectory::default();
        dir.insert("alice", "pw", Role::Client).unwrap();
        assert!(dir.find("Alice").is_none());
    }

    #[test]
    fn delete_missing_reports_not_found() {
        let mut dir = AccountDirectory::default();
        assert_eq!(
            dir.delete("ghost").unwrap_err(),
            ClinicError::account_not_found("ghost")
        );
    }

    #[test]
    fn collisions_prepend_and_delete_preserves_chain_order() {
        // one bucket forces every identifier into the same chain
        let mut dir = AccountDirectory::new(1);
        for id in ["a", "b", "c", "d"] {
            dir.insert(id, "pw", Role::Client).unwrap();
        }
        assert_eq!(dir.chain(0), vec!["d", "c", "b", "a"]);

        dir.delete("c").unwrap();
        assert_eq!(dir.chain(0), vec!["d", "b", "a"]);

        // freed slot gets reused, chain still newest first
        dir.insert("e", "pw", Role::Client).unwrap();
        assert_eq!(dir.chain(0), vec!["e", "d", "b", "a"]);
        assert_eq!(dir.len(), 4);
    }

    #[test]
    fn iteration_is_bucket_then_chain_order_and_restartable() {
        let mut dir = AccountDirectory::new(2);
        // "a" = 97 -> bucket 1, "b" = 98 -> bucket 0
        dir.insert("a", "pw", Role::Client).unwrap();
        dir.insert("b", "pw", Role::Client).unwrap();
        dir.insert("d", "pw", Role::Client).unwrap();

        let first: Vec<_> = dir.iter().map(|a| a.identifier.clone()).collect();
        let second: Vec<_> = dir.iter().map(|a| a.identifier.clone()).collect();
        assert_eq!(first, vec!["d", "b", "a"]);
        assert_eq!(first, second);
    }

    #[test]
    fn delete_releases_reservations() {
        use super::super::types::Reservation;

        let mut dir = AccountDirectory::default();
        dir.insert("bob", "pw", Role::Client).unwrap();
        dir.find_mut("bob").unwrap().reservations.push_back(Reservation {
            date: "2025-05-01".into(),
            time: "09:00".into(),
            doctor: "drdoom".into(),
            patient: "bob".into(),
            notes: String::new(),
        });
        let removed = dir.delete("bob").unwrap();
        assert_eq!(removed.reservations.len(), 1);
        assert_eq!(dir.iter().flat_map(|a| a.reservations.iter()).count(), 0);
    }

    #[test]
    fn random_operations_agree_with_a_map() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::HashMap;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        // few buckets and a small key space so chains get long and keys repeat
        let mut dir = AccountDirectory::new(7);
        let mut model: HashMap<String, String> = HashMap::new();

        for step in 0..5_000 {
            let id = format!("user{}", rng.gen_range(0..60));
            match rng.gen_range(0..3) {
                0 => {
                    let secret = format!("pw{}", step);
                    let inserted = dir.insert(&id, &secret, Role::Client);
                    if model.contains_key(&id) {
                        assert_eq!(inserted, Err(ClinicError::DuplicateIdentifier(id.clone())));
                    } else {
                        assert!(inserted.is_ok());
                        model.insert(id.clone(), secret);
                    }
                }
                1 => {
                    let deleted = dir.delete(&id).map(|a| a.secret);
                    match model.remove(&id) {
                        Some(secret) => assert_eq!(deleted, Ok(secret)),
                        None => assert_eq!(deleted, Err(ClinicError::account_not_found(id.as_str()))),
                    }
                }
                _ => {
                    let found = dir.find(&id).map(|a| a.secret.as_str());
                    assert_eq!(found, model.get(&id).map(String::as_str), "step {}", step);
                }
            }
            assert_eq!(dir.len(), model.len());
        }

        let mut listed: Vec<_> = dir.iter().map(|a| a.identifier.clone()).collect();
        let mut expected: Vec<_> = model.keys().cloned().collect();
        listed.sort();
        expected.sort();
        assert_eq!(listed, expected);
    }
}
