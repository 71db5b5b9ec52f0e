use crate::error::Error;
use crate::primitive::{Bcrypt, Primitive};
use crate::{MAX_COST, MIN_COST};

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The time budget used when none is given: at most four hashes per second per thread.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(250);

/// How often the sample password is hashed at each cost. The average of these runs is
/// compared against the budget.
pub const DEFAULT_ROUNDS: u32 = 20;

const SAMPLE_PASSWORD: &[u8; 16] = b"E&dWBjxaE*8V#q2m";

/// Runs a benchmark to find the highest cost this machine can hash with inside a time
/// budget.
///
/// The benchmark hashes a fixed sample password [`DEFAULT_ROUNDS`] times at each cost,
/// starting at [`MIN_COST`], and stops at the first cost whose average hashing time is not
/// under the budget, or at [`MAX_COST`]. That last measured cost is returned, so the result
/// may take up to one doubling longer than the budget. Use [`Calibrator::strict()`] to get
/// the last cost that stayed under the budget instead.
///
/// Calibration blocks the calling thread for its whole duration (usually somewhere between
/// a few hundred milliseconds and several seconds). Run it on a separate thread if that is a
/// problem.
///
/// ```no_run
/// use adaptive_bcrypt::Calibrator;
/// use std::time::Duration;
///
/// let cost = Calibrator::new()
///     .max_duration(Duration::from_millis(100))
///     .suitable_cost()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Calibrator<'a> {
    max_duration: Duration,
    rounds: u32,
    sample_password: &'a [u8],
    strict: bool,
}

impl Default for Calibrator<'_> {
    /// A 250 ms budget, 20 rounds per cost and a fixed 16-byte sample password.
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            rounds: DEFAULT_ROUNDS,
            sample_password: SAMPLE_PASSWORD,
            strict: false,
        }
    }
}

impl<'a> Calibrator<'a> {
    /// Create a new `Calibrator` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The longest a single hash may take on average.
    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// How many hashes are averaged per cost. Zero is treated as one.
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// The password that is hashed during the benchmark. bcrypt's running time does not
    /// depend on the password's content, so the default fixed password is fine for almost
    /// everybody.
    pub fn sample_password<P>(mut self, password: &'a P) -> Self
    where
        P: AsRef<[u8]> + ?Sized,
    {
        self.sample_password = password.as_ref();
        self
    }

    /// When set, the returned cost is the last one that stayed under the budget (but never
    /// less than [`MIN_COST`]) instead of the first one that exceeded it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Runs the benchmark against bcrypt.
    pub fn suitable_cost(&self) -> Result<u32, Error> {
        self.suitable_cost_with(&Bcrypt::new())
    }

    /// Runs the benchmark against any [`Primitive`].
    ///
    /// Errors returned by the primitive while benchmarking are logged and otherwise ignored,
    /// so a single failing hash does not abort the calibration. A failing hash usually
    /// returns quickly, which lowers the measured average.
    pub fn suitable_cost_with<H>(&self, primitive: &H) -> Result<u32, Error>
    where
        H: Primitive + ?Sized,
    {
        if self.max_duration.is_zero() {
            return Err(Error::InvalidBudget);
        }

        if self.sample_password.is_empty() {
            return Err(Error::InvalidParameter("Sample password is empty"));
        }

        let rounds = self.rounds.max(1);
        let mut cost = MIN_COST;

        loop {
            let before = Instant::now();

            for _ in 0..rounds {
                if let Err(e) = primitive.hash(self.sample_password, cost) {
                    warn!(cost, error = %e, "Hashing failed during cost calibration");
                }
            }

            let average = before.elapsed() / rounds;
            debug!(cost, ?average, "Measured hashing time");

            let exceeded = average >= self.max_duration;

            if exceeded || cost == MAX_COST {
                if exceeded && self.strict {
                    cost = cost.saturating_sub(1).max(MIN_COST);
                }

                info!(cost, max_duration = ?self.max_duration, "Calibrated hashing cost");
                return Ok(cost);
            }

            cost += 1;
        }
    }
}

/// Runs the default benchmark with the given time budget. See [`Calibrator`].
pub fn suitable_cost(max_duration: Duration) -> Result<u32, Error> {
    Calibrator::new().max_duration(max_duration).suitable_cost()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    /// Hashes instantly into `cost:password` and counts the calls it received.
    #[derive(Default)]
    pub(crate) struct Echo {
        pub(crate) calls: AtomicU32,
    }

    impl Primitive for Echo {
        fn hash(&self, password: &[u8], cost: u32) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(format!("{}:{}", cost, String::from_utf8_lossy(password)))
        }

        fn verify(&self, hash: &str, password: &[u8]) -> Result<(), Error> {
            let (_, stored) = hash.split_once(':').ok_or(Error::InvalidHash("No cost"))?;

            if stored.as_bytes() == password {
                Ok(())
            } else {
                Err(Error::Mismatch)
            }
        }

        fn cost_of(&self, hash: &str) -> Result<u32, Error> {
            let (cost, _) = hash.split_once(':').ok_or(Error::InvalidHash("No cost"))?;
            cost.parse().map_err(|_| Error::InvalidHash("Invalid cost"))
        }
    }

    /// Sleeps for a fixed time per hash, regardless of the cost.
    struct Sleepy(Duration);

    impl Primitive for Sleepy {
        fn hash(&self, _password: &[u8], _cost: u32) -> Result<String, Error> {
            thread::sleep(self.0);
            Ok(String::new())
        }

        fn verify(&self, _hash: &str, _password: &[u8]) -> Result<(), Error> {
            Err(Error::Mismatch)
        }

        fn cost_of(&self, _hash: &str) -> Result<u32, Error> {
            Err(Error::InvalidHash("Unsupported"))
        }
    }

    /// Sleeps longer the higher the cost: nothing at `MIN_COST`, then `step` more per cost.
    struct Ramp {
        step: Duration,
    }

    impl Primitive for Ramp {
        fn hash(&self, _password: &[u8], cost: u32) -> Result<String, Error> {
            thread::sleep(self.step * (cost - MIN_COST));
            Ok(String::new())
        }

        fn verify(&self, _hash: &str, _password: &[u8]) -> Result<(), Error> {
            Err(Error::Mismatch)
        }

        fn cost_of(&self, _hash: &str) -> Result<u32, Error> {
            Err(Error::InvalidHash("Unsupported"))
        }
    }

    struct Failing;

    impl Primitive for Failing {
        fn hash(&self, _password: &[u8], _cost: u32) -> Result<String, Error> {
            Err(Error::Primitive(String::from("out of memory")))
        }

        fn verify(&self, _hash: &str, _password: &[u8]) -> Result<(), Error> {
            Err(Error::Mismatch)
        }

        fn cost_of(&self, _hash: &str) -> Result<u32, Error> {
            Err(Error::InvalidHash("Unsupported"))
        }
    }

    #[test]
    fn test_fast_primitive_reaches_max_cost() {
        let primitive = Echo::default();
        let cost = Calibrator::new()
            .max_duration(Duration::from_secs(1))
            .suitable_cost_with(&primitive)
            .unwrap();

        assert_eq!(cost, MAX_COST);

        let measured_costs = MAX_COST - MIN_COST + 1;
        assert_eq!(
            primitive.calls.load(Ordering::Relaxed),
            measured_costs * DEFAULT_ROUNDS
        );
    }

    #[test]
    fn test_slow_primitive_stays_at_min_cost() {
        let cost = Calibrator::new()
            .max_duration(Duration::from_nanos(1))
            .rounds(2)
            .suitable_cost_with(&Sleepy(Duration::from_micros(10)))
            .unwrap();

        assert_eq!(cost, MIN_COST);

        let cost = Calibrator::new()
            .max_duration(Duration::from_nanos(1))
            .rounds(2)
            .strict(true)
            .suitable_cost_with(&Sleepy(Duration::from_micros(10)))
            .unwrap();

        assert_eq!(cost, MIN_COST);
    }

    #[test]
    fn test_overshoot_and_strict() {
        // 0 ms, 10 ms, 20 ms, 30 ms, ... for costs 10, 11, 12, 13, ...
        let primitive = Ramp {
            step: Duration::from_millis(10),
        };

        let calibrator = Calibrator::new()
            .max_duration(Duration::from_millis(25))
            .rounds(1);

        // Cost 13 is the first to take longer than the budget
        assert_eq!(calibrator.suitable_cost_with(&primitive).unwrap(), 13);
        assert_eq!(
            calibrator
                .clone()
                .strict(true)
                .suitable_cost_with(&primitive)
                .unwrap(),
            12
        );
    }

    #[test]
    fn test_monotonic_in_budget() {
        let primitive = Ramp {
            step: Duration::from_millis(10),
        };

        let mut costs = Vec::new();
        for budget_ms in [5, 15, 25, 35, 45] {
            let cost = Calibrator::new()
                .max_duration(Duration::from_millis(budget_ms))
                .rounds(1)
                .suitable_cost_with(&primitive)
                .unwrap();

            assert!(cost > MIN_COST && cost < MAX_COST, "cost {cost} for {budget_ms} ms");
            costs.push(cost);
        }

        assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{costs:?}");
        assert!(costs[0] < costs[costs.len() - 1], "{costs:?}");

        // Without growth per cost, a budget either fits every cost or none
        let flat = Sleepy(Duration::from_micros(50));
        for (budget, expected) in [
            (Duration::from_nanos(1), MIN_COST),
            (Duration::from_secs(10), MAX_COST),
        ] {
            let cost = Calibrator::new()
                .max_duration(budget)
                .rounds(1)
                .suitable_cost_with(&flat)
                .unwrap();

            assert_eq!(cost, expected);
        }
    }

    #[test]
    fn test_failures_do_not_abort() {
        let cost = Calibrator::new()
            .max_duration(Duration::from_secs(1))
            .suitable_cost_with(&Failing)
            .unwrap();

        assert!((MIN_COST..=MAX_COST).contains(&cost));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Calibrator::new()
                .max_duration(Duration::ZERO)
                .suitable_cost_with(&Echo::default()),
            Err(Error::InvalidBudget)
        ));

        assert!(matches!(
            suitable_cost(Duration::ZERO),
            Err(Error::InvalidBudget)
        ));

        assert!(matches!(
            Calibrator::new()
                .sample_password("")
                .suitable_cost_with(&Echo::default()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_rounds() {
        let primitive = Echo::default();
        let cost = Calibrator::new()
            .rounds(0)
            .suitable_cost_with(&primitive)
            .unwrap();

        assert_eq!(cost, MAX_COST);
        assert_eq!(
            primitive.calls.load(Ordering::Relaxed),
            MAX_COST - MIN_COST + 1
        );
    }

    #[test]
    fn test_bcrypt_calibration() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let cost = Calibrator::new()
            .max_duration(Duration::from_millis(1))
            .rounds(1)
            .suitable_cost()
            .unwrap();

        assert!((MIN_COST..=MAX_COST).contains(&cost));
    }
}
