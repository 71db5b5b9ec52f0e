use std::fmt;

/// Errors that may occur when using this crate
#[derive(Debug)]
pub enum Error {
    /// The password does not match the stored hash
    Mismatch,

    /// Indicates that a provided hash was expected to be valid, but is invalid. This
    /// normally occurs when a hash is improperly formatted.
    InvalidHash(&'static str),

    /// Indicates that the user of a type or function has specified an invalid parameter
    InvalidParameter(&'static str),

    /// A calibration was requested with a time budget of zero
    InvalidBudget,

    /// An error reported by the underlying hashing primitive
    Primitive(String),
}

impl Error {
    /// Returns `true` if the error means the password could not be verified against the
    /// stored hash, either because it does not match or because the hash is malformed.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::Mismatch | Error::InvalidHash(_))
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    /// Turn an `Error` into a descriptive string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mismatch => write!(f, "BcryptError: Hash and password do not match"),
            Error::InvalidHash(msg) => write!(f, "BcryptError: Invalid hash: {}", msg),
            Error::InvalidParameter(msg) => {
                write!(f, "BcryptError: Invalid parameter: {}", msg)
            }
            Error::InvalidBudget => {
                write!(f, "BcryptError: Calibration budget must be greater than zero")
            }
            Error::Primitive(msg) => write!(f, "BcryptError: Error from primitive: {}", msg),
        }
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Primitive(err.to_string())
    }
}
