use crate::error::Error;
use crate::lexer::TokenizedHash;

use base64::alphabet::BCRYPT;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

const B64_BCRYPT: GeneralPurpose = GeneralPurpose::new(&BCRYPT, NO_PAD);

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 23;
const B64_HASH_LEN: usize = 31;

/// The lowest and highest cost the bcrypt algorithm itself accepts. These are wider than the
/// range a [`crate::PasswordHasher`] will hash with, so that older hashes can still be read.
const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

/// The prefix of a bcrypt hash string. All four variants are computed identically by
/// this crate; the prefix only matters for interoperability with other implementations.
///
/// `$2b$` is a good default. `$2y$` is what PHP's `password_hash()` produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    /// `$2a$`
    TwoA,

    /// `$2b$`
    TwoB,

    /// `$2x$`
    TwoX,

    /// `$2y$`
    TwoY,
}

impl Version {
    fn as_str(&self) -> &'static str {
        match self {
            Version::TwoA => "2a",
            Version::TwoB => "2b",
            Version::TwoX => "2x",
            Version::TwoY => "2y",
        }
    }
}

impl From<Version> for bcrypt::Version {
    fn from(version: Version) -> Self {
        match version {
            Version::TwoA => bcrypt::Version::TwoA,
            Version::TwoB => bcrypt::Version::TwoB,
            Version::TwoX => bcrypt::Version::TwoX,
            Version::TwoY => bcrypt::Version::TwoY,
        }
    }
}

/// A parsed bcrypt hash: the version prefix, the cost it was computed with, the salt and
/// the digest
#[derive(Clone, Debug)]
pub struct Hash {
    version: Version,
    cost: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl fmt::Display for Hash {
    /// Generates a hash string in the modular crypt format used by every bcrypt
    /// implementation, for example:
    ///
    /// _$2b$12$Su9Bpprp2BYnc3f12T.DW.gpQSUBoPu41RaXguWHXQmVE4c.Wvwoe_
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${:02}${}{}",
            self.version.as_str(),
            self.cost,
            B64_BCRYPT.encode(&self.salt),
            B64_BCRYPT.encode(&self.hash),
        )
    }
}

impl FromStr for Hash {
    type Err = Error;

    /// Deserializes a hash string into its parts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokenized_hash = TokenizedHash::from_str(s)?;

        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&tokenized_hash.cost) {
            return Err(Error::InvalidHash("Cost is out of range"));
        }

        let decoded_salt = match B64_BCRYPT.decode(tokenized_hash.b64_salt) {
            Ok(s) if s.len() == SALT_LEN => s,
            _ => {
                return Err(Error::InvalidHash(
                    "Invalid character in base64-encoded salt",
                ))
            }
        };

        let decoded_hash = match B64_BCRYPT.decode(tokenized_hash.b64_hash) {
            Ok(h) if h.len() == HASH_LEN => h,
            _ => {
                return Err(Error::InvalidHash(
                    "Invalid character in base64-encoded hash",
                ))
            }
        };

        Ok(Self {
            version: tokenized_hash.version,
            cost: tokenized_hash.cost,
            salt: decoded_salt,
            hash: decoded_hash,
        })
    }
}

impl Hash {
    /// The version prefix the hash was stored with.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The cost the hash was computed with.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Returns a reference to a byte slice of the digest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.hash
    }

    /// Returns a reference to a byte slice of the salt used to generate the hash.
    pub fn salt_bytes(&self) -> &[u8] {
        &self.salt
    }

    /// Checks if the hash matches the provided password.
    ///
    /// Because verification requires re-hashing the password at the stored cost, this is an
    /// expensive operation.
    pub fn verify<P>(&self, password: &P) -> bool
    where
        P: AsRef<[u8]> + ?Sized,
    {
        let salt: [u8; SALT_LEN] = match self.salt.as_slice().try_into() {
            Ok(s) => s,
            Err(_) => return false,
        };

        let recomputed = match bcrypt::hash_with_salt(password.as_ref(), self.cost, salt) {
            Ok(parts) => parts.format_for_version(bcrypt::Version::TwoB),
            Err(_) => return false,
        };

        // The digest is the tail of the hash string
        let b64_hash = &recomputed[recomputed.len().saturating_sub(B64_HASH_LEN)..];
        let recomputed_hash = match B64_BCRYPT.decode(b64_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        if self.hash.len() != recomputed_hash.len() || self.hash.is_empty() {
            return false;
        }

        // Do bitwise comparison to prevent timing attacks (entire length of the digest must
        // be compared)
        let mut hashes_dont_match = 0u8;
        for (recomputed_byte, hash_byte) in recomputed_hash.iter().zip(self.hash.iter()) {
            hashes_dont_match |= recomputed_byte ^ hash_byte;
        }

        hashes_dont_match == 0
    }
}
