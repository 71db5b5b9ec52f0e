use crate::error::Error;
use crate::hash::{Hash, Version};

use rand::{rngs::OsRng, Fill};
use std::str::FromStr;

/// The password hashing algorithm a [`crate::PasswordHasher`] and a [`crate::Calibrator`]
/// delegate to. Salting and the hashing itself are the primitive's job; this crate only
/// decides which cost to use and when a stored hash should be replaced.
///
/// Implementations must be safe to share between threads.
pub trait Primitive: Send + Sync {
    /// Hashes `password` at `cost` and returns the encoded hash string.
    fn hash(&self, password: &[u8], cost: u32) -> Result<String, Error>;

    /// Checks `password` against an encoded hash. Returns [`Error::Mismatch`] if the
    /// password is wrong and [`Error::InvalidHash`] if the hash cannot be parsed.
    fn verify(&self, hash: &str, password: &[u8]) -> Result<(), Error>;

    /// Extracts the cost an encoded hash was computed with.
    fn cost_of(&self, hash: &str) -> Result<u32, Error>;

    /// Checks `password` like [`Primitive::verify()`] and, on a match, also returns the cost
    /// the hash was computed with, or `None` if it cannot be read.
    ///
    /// The default calls `verify` and then `cost_of`. Override it if both need to decode the
    /// hash and that can be done once.
    fn verify_with_cost(&self, hash: &str, password: &[u8]) -> Result<Option<u32>, Error> {
        self.verify(hash, password)?;
        Ok(self.cost_of(hash).ok())
    }
}

/// The bcrypt primitive, backed by the [bcrypt crate](https://docs.rs/bcrypt).
#[derive(Clone, Copy, Debug)]
pub struct Bcrypt {
    version: Version,
    custom_salt: Option<[u8; 16]>,
}

impl Default for Bcrypt {
    /// Produces `$2b$` hashes with a secure-random salt.
    fn default() -> Self {
        Self {
            version: Version::TwoB,
            custom_salt: None,
        }
    }
}

impl Bcrypt {
    /// Create a new `Bcrypt` that produces `$2b$` hashes with a secure-random salt.
    pub fn new() -> Self {
        Self::default()
    }

    /// The prefix written into generated hashes. Verification accepts every prefix
    /// regardless of this setting.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// When left unspecified, a salt is generated using a cryptographically-secure random
    /// number generator. Only use this if you need deterministic hashes, e.g. in tests.
    pub fn custom_salt(mut self, salt: [u8; 16]) -> Self {
        self.custom_salt = Some(salt);
        self
    }
}

impl Primitive for Bcrypt {
    fn hash(&self, password: &[u8], cost: u32) -> Result<String, Error> {
        let salt = match self.custom_salt {
            Some(s) => s,
            None => {
                let mut salt = [0u8; 16];
                if let Err(e) = salt.try_fill(&mut OsRng) {
                    return Err(Error::Primitive(format!("Failed to generate salt: {}", e)));
                }

                salt
            }
        };

        let parts = bcrypt::hash_with_salt(password, cost, salt)?;
        Ok(parts.format_for_version(self.version.into()))
    }

    fn verify(&self, hash: &str, password: &[u8]) -> Result<(), Error> {
        self.verify_with_cost(hash, password).map(|_| ())
    }

    fn cost_of(&self, hash: &str) -> Result<u32, Error> {
        Ok(Hash::from_str(hash)?.cost())
    }

    fn verify_with_cost(&self, hash: &str, password: &[u8]) -> Result<Option<u32>, Error> {
        let hash = Hash::from_str(hash)?;

        if hash.verify(password) {
            Ok(Some(hash.cost()))
        } else {
            Err(Error::Mismatch)
        }
    }
}
