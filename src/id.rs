//! Transaction identifier generation
//!
//! Identifiers are random strings over a fixed alphanumeric alphabet. Each call
//! draws from the calling thread's own cryptographically seeded generator, so
//! any number of threads can generate identifiers at once without sharing state.

use rand::Rng;

use crate::constants::{DEFAULT_TRANSACTION_ID_LENGTH, ID_ALPHABET};

/// Generate a random string of exactly `len` characters from [`ID_ALPHABET`]
///
/// Uniqueness is probabilistic only. The audit writer refuses to overwrite an
/// existing record, which is what catches the rare collision.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Generate a transaction identifier of the default length
pub fn new_transaction_id() -> String {
    random_string(DEFAULT_TRANSACTION_ID_LENGTH)
}
