#![deny(missing_docs)]

//! A library for hashing passwords with [bcrypt](https://en.wikipedia.org/wiki/Bcrypt) at a
//! cost that fits the machine it runs on.
//!
//! bcrypt's cost is exponential: every increment doubles the time it takes to compute a hash.
//! A cost that was reasonable a few years ago is too cheap on today's hardware, and a cost
//! picked on a fast workstation might be painfully slow on a small server. This crate measures
//! how long hashing takes on the current machine and picks the highest cost that stays within
//! a time budget (250 ms by default). When a user logs in with a password whose stored hash
//! was computed with a lower cost, the password is hashed again at the current cost so the
//! stored hash can be upgraded.
//!
//! The bcrypt algorithm itself is provided by the [bcrypt crate](https://docs.rs/bcrypt).
//!
//! # Usage
//!
//! To use adaptive-bcrypt, add the following to your Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! adaptive-bcrypt = "0.1"
//! ```
//!
//! # Examples
//!
//! Hash a password, then verify the hash:
//!
//! ```rust
//! use adaptive_bcrypt::PasswordHasher;
//!
//! let hasher = PasswordHasher::new(Some(10));
//! let hash = hasher.generate("password").unwrap();
//!
//! assert!(hasher.verify_and_rehash(&hash, "password").unwrap().is_none());
//! assert!(hasher.verify_and_rehash(&hash, "hunter2").is_err());
//! ```
//!
//! Upgrade a hash that was computed with an outdated cost:
//!
//! ```rust
//! use adaptive_bcrypt::{Hash, PasswordHasher};
//! use std::str::FromStr;
//!
//! let stored = "$2b$10$abcdefghijklmnopqrstuuzTFqCkPG.dWmCoosTDvUmM5xNlgyAV6";
//! let hasher = PasswordHasher::new(Some(11));
//!
//! if let Some(new_hash) = hasher.verify_and_rehash(stored, "E&dWBjxaE*8V").unwrap() {
//!     // Store `new_hash` in place of `stored`
//!     assert_eq!(Hash::from_str(&new_hash).unwrap().cost(), 11);
//! }
//! ```
//!
//! Let the machine pick the cost. This benchmarks bcrypt for a few seconds:
//!
//! ```no_run
//! use adaptive_bcrypt::PasswordHasher;
//!
//! let hasher = PasswordHasher::new(None);
//! println!("Hashing with cost {}", hasher.cost());
//! ```
//!
//! Calibrate with a different budget, e.g. on a worker thread at startup:
//!
//! ```no_run
//! use adaptive_bcrypt::{Calibrator, PasswordHasher};
//! use std::thread;
//! use std::time::Duration;
//!
//! let cost = thread::spawn(|| {
//!     Calibrator::new()
//!         .max_duration(Duration::from_millis(500))
//!         .suitable_cost()
//! })
//! .join()
//! .unwrap()
//! .unwrap();
//!
//! let hasher = PasswordHasher::new(Some(cost));
//! ```
//!
//! Read the cost from the `BCRYPT_COST` environment variable, calibrating if it is unset:
//!
//! ```no_run
//! use adaptive_bcrypt::PasswordHasher;
//!
//! let hasher = PasswordHasher::from_env();
//! ```
//!
//! Produce `$2y$` hashes with a fixed salt:
//!
//! ```rust
//! use adaptive_bcrypt::{Bcrypt, PasswordHasher, Version};
//!
//! let bcrypt = Bcrypt::new()
//!     .version(Version::TwoY)
//!     .custom_salt(*b"dontusethissalt!");
//!
//! let hasher = PasswordHasher::with_primitive(bcrypt, Some(10));
//! let hash = hasher.generate("password").unwrap();
//!
//! assert!(hash.starts_with("$2y$10$"));
//! assert_eq!(hash, hasher.generate("password").unwrap());
//! ```

mod calibrate;
mod error;
mod hash;
mod hasher;
mod lexer;
mod primitive;

pub use calibrate::{suitable_cost, Calibrator, DEFAULT_MAX_DURATION, DEFAULT_ROUNDS};
pub use error::Error;
pub use hash::{Hash, Version};
pub use hasher::{PasswordHasher, COST_ENV_VAR};
pub use primitive::{Bcrypt, Primitive};

/// The lowest cost a [`PasswordHasher`] hashes with and where calibration starts.
pub const MIN_COST: u32 = 10;

/// The highest cost a [`PasswordHasher`] hashes with. This is also the highest cost bcrypt
/// supports.
pub const MAX_COST: u32 = 31;
