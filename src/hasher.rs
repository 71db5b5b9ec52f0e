use crate::calibrate::Calibrator;
use crate::error::Error;
use crate::primitive::{Bcrypt, Primitive};
use crate::{MAX_COST, MIN_COST};

use std::env;
use tracing::{debug, warn};

/// The environment variable read by [`PasswordHasher::from_env()`].
pub const COST_ENV_VAR: &str = "BCRYPT_COST";

/// Hashes passwords at a fixed cost and upgrades stored hashes that were computed with a
/// lower one.
///
/// The cost is chosen once, when the `PasswordHasher` is created, and never changes. Several
/// hashers with different costs can exist side by side, e.g. while rolling out a higher cost.
#[derive(Clone, Debug)]
pub struct PasswordHasher<P = Bcrypt> {
    cost: u32,
    primitive: P,
}

impl Default for PasswordHasher {
    /// Create a new bcrypt `PasswordHasher` with a calibrated cost. See
    /// [`PasswordHasher::new()`].
    fn default() -> Self {
        Self::new(None)
    }
}

impl PasswordHasher {
    /// Create a new bcrypt `PasswordHasher`.
    ///
    /// With `None`, a [`Calibrator`] runs with its default 250 ms budget to pick the cost.
    /// Costs outside [`MIN_COST`]..=[`MAX_COST`] are clamped into that range.
    pub fn new(cost: Option<u32>) -> Self {
        Self::with_primitive(Bcrypt::new(), cost)
    }

    /// Create a new bcrypt `PasswordHasher` with the cost taken from the `BCRYPT_COST`
    /// environment variable. If the variable is missing, is not a number or is `0`, the
    /// cost is calibrated instead.
    pub fn from_env() -> Self {
        let value = env::var(COST_ENV_VAR).ok();
        Self::new(cost_from_env_value(value.as_deref()))
    }
}

/// `None` means the cost should be calibrated.
fn cost_from_env_value(value: Option<&str>) -> Option<u32> {
    match value.map(|v| v.trim().parse::<u32>()) {
        Some(Ok(0)) | None => None,
        Some(Ok(c)) => Some(c),
        Some(Err(_)) => {
            warn!("{} is not a number, calibrating cost instead", COST_ENV_VAR);
            None
        }
    }
}

impl<P: Primitive> PasswordHasher<P> {
    /// Create a new `PasswordHasher` that hashes with the given [`Primitive`]. The cost is
    /// handled as in [`PasswordHasher::new()`], calibrating against `primitive`.
    pub fn with_primitive(primitive: P, cost: Option<u32>) -> Self {
        let cost = match cost {
            Some(c) => c,
            // The default calibrator has a nonzero budget and sample password, so it can't fail
            None => Calibrator::new()
                .suitable_cost_with(&primitive)
                .unwrap_or(MIN_COST),
        };

        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
            primitive,
        }
    }

    /// The cost new hashes are generated with.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes a password at this hasher's cost.
    ///
    /// This is an expensive operation. Errors from the primitive are returned unchanged.
    pub fn generate<PW>(&self, password: &PW) -> Result<String, Error>
    where
        PW: AsRef<[u8]> + ?Sized,
    {
        self.primitive.hash(password.as_ref(), self.cost)
    }

    /// Checks a password against a stored hash.
    ///
    /// If the password matches and the stored hash was computed with a lower cost than this
    /// hasher's, the password is hashed again and the new hash is returned. The caller should
    /// store it in place of the old one. `Ok(None)` means the password matches and the stored
    /// hash is fine as it is.
    ///
    /// Returns [`Error::Mismatch`] if the password is wrong and [`Error::InvalidHash`] if the
    /// stored hash is malformed. A hash is never regenerated when verification fails.
    pub fn verify_and_rehash<PW>(
        &self,
        stored: &str,
        password: &PW,
    ) -> Result<Option<String>, Error>
    where
        PW: AsRef<[u8]> + ?Sized,
    {
        match self.primitive.verify_with_cost(stored, password.as_ref())? {
            Some(stored_cost) if stored_cost < self.cost => (),
            _ => return Ok(None),
        }

        match self.generate(password) {
            Ok(new_hash) => {
                debug!(cost = self.cost, "Rehashed password with outdated cost");
                Ok(Some(new_hash))
            }
            Err(e) => {
                warn!(error = %e, "Failed to rehash password with outdated cost");
                Ok(None)
            }
        }
    }

    /// Returns `true` if the stored hash was computed with a lower cost than this hasher's.
    /// Hashes whose cost cannot be read are left alone.
    ///
    /// This does not check the password, so it is cheap.
    pub fn needs_rehash(&self, stored: &str) -> bool {
        match self.primitive.cost_of(stored) {
            Ok(stored_cost) => stored_cost < self.cost,
            Err(_) => false,
        }
    }
}
