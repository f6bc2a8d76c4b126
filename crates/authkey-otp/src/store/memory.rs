//! In-memory registration store.

use super::{PendingOtp, PendingTransaction};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// What a verification attempt should be checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A locally stored code exists for the phone.
    Local(String),
    /// Only a provider transaction exists for the phone.
    Remote(String),
    /// Nothing is pending.
    Missing,
}

/// Phone-keyed OTP and transaction records.
///
/// Records live until verified, overwritten by a new registration, or, when
/// a TTL is configured, until they age past it.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    otps: HashMap<String, PendingOtp>,
    transactions: HashMap<String, PendingTransaction>,
    ttl: Option<Duration>,
}

impl RegistrationStore {
    /// Create an empty store whose records never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with an optional record lifetime.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.ttl {
            // A negative age means clock skew, keep the record.
            Some(ttl) => (now - issued_at).to_std().map(|age| age >= ttl).unwrap_or(false),
            None => false,
        }
    }

    /// Store a freshly issued code, replacing any previous one.
    pub fn insert_otp(&mut self, phone: &str, code: String) {
        self.insert_otp_at(phone, code, Utc::now());
    }

    /// Store a code as issued at `now`.
    pub fn insert_otp_at(&mut self, phone: &str, code: String, now: DateTime<Utc>) {
        self.purge_expired(phone, now);
        self.otps.insert(
            phone.to_string(),
            PendingOtp {
                code,
                issued_at: now,
            },
        );
    }

    /// Store the provider transaction for a phone, replacing any previous one.
    pub fn insert_transaction(&mut self, phone: &str, log_id: String) {
        self.insert_transaction_at(phone, log_id, Utc::now());
    }

    /// Store a provider transaction as accepted at `now`.
    pub fn insert_transaction_at(&mut self, phone: &str, log_id: String, now: DateTime<Utc>) {
        self.purge_expired(phone, now);
        self.transactions.insert(
            phone.to_string(),
            PendingTransaction {
                log_id,
                issued_at: now,
            },
        );
    }

    /// Get the live code for a phone.
    pub fn otp(&self, phone: &str) -> Option<&PendingOtp> {
        self.otp_at(phone, Utc::now())
    }

    /// Get the code for a phone if it is still live at `now`.
    pub fn otp_at(&self, phone: &str, now: DateTime<Utc>) -> Option<&PendingOtp> {
        self.otps
            .get(phone)
            .filter(|r| !self.is_expired(r.issued_at, now))
    }

    /// Get the live provider transaction for a phone.
    pub fn transaction(&self, phone: &str) -> Option<&PendingTransaction> {
        self.transaction_at(phone, Utc::now())
    }

    /// Get the provider transaction for a phone if it is still live at `now`.
    pub fn transaction_at(&self, phone: &str, now: DateTime<Utc>) -> Option<&PendingTransaction> {
        self.transactions
            .get(phone)
            .filter(|r| !self.is_expired(r.issued_at, now))
    }

    /// Decide which verification path applies. A local code always wins.
    pub fn lookup(&self, phone: &str) -> Lookup {
        self.lookup_at(phone, Utc::now())
    }

    /// Decide the verification path as of `now`.
    pub fn lookup_at(&self, phone: &str, now: DateTime<Utc>) -> Lookup {
        if let Some(otp) = self.otp_at(phone, now) {
            return Lookup::Local(otp.code.clone());
        }
        match self.transaction_at(phone, now) {
            Some(tx) => Lookup::Remote(tx.log_id.clone()),
            None => Lookup::Missing,
        }
    }

    /// Remove every record for a phone.
    pub fn clear(&mut self, phone: &str) {
        self.otps.remove(phone);
        self.transactions.remove(phone);
    }

    /// Remove the transaction for a phone only if it still carries `log_id`.
    ///
    /// Returns `false` when a newer registration replaced it in the meantime.
    pub fn remove_transaction_if(&mut self, phone: &str, log_id: &str) -> bool {
        match self.transactions.get(phone) {
            Some(tx) if tx.log_id == log_id => {
                self.transactions.remove(phone);
                true
            }
            _ => false,
        }
    }

    fn purge_expired(&mut self, phone: &str, now: DateTime<Utc>) {
        if self.ttl.is_none() {
            return;
        }
        if self.otp_at(phone, now).is_none() {
            self.otps.remove(phone);
        }
        if self.transaction_at(phone, now).is_none() {
            self.transactions.remove(phone);
        }
    }

    /// Number of stored codes, including expired ones not yet purged.
    pub fn otp_count(&self) -> usize {
        self.otps.len()
    }

    /// Number of stored transactions, including expired ones not yet purged.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
