use crate::error::Error;
use crate::hash::Version;

use std::str::FromStr;

const B64_SALT_LEN: usize = 22; // 16 bytes, bcrypt-base64-encoded (no padding)
const B64_HASH_LEN: usize = 31; // 23 bytes, bcrypt-base64-encoded (no padding)

pub struct TokenizedHash {
    pub version: Version,
    pub cost: u32,
    pub b64_salt: String,
    pub b64_hash: String,
}

impl FromStr for TokenizedHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        enum HashStates {
            Start,
            VersionStart,
            VersionMajor,
            VersionComplete,
            CostFirstDigit,
            CostSecondDigit,
            CostComplete,
            Salt,
            Hash,
        }

        let mut state = HashStates::Start;

        let mut version = Version::TwoB;
        let mut cost = 0..0;

        let mut salt = String::with_capacity(B64_SALT_LEN);
        let mut hash = String::with_capacity(B64_HASH_LEN);

        for (i, c) in s.char_indices() {
            match state {
                HashStates::Start => {
                    state = match c {
                        '$' => HashStates::VersionStart,
                        _ => return Err(Error::InvalidHash("Must begin with $2")),
                    };
                }

                HashStates::VersionStart => {
                    state = match c {
                        '2' => HashStates::VersionMajor,
                        _ => return Err(Error::InvalidHash("Must begin with $2")),
                    };
                }

                HashStates::VersionMajor => {
                    version = match c {
                        'a' => Version::TwoA,
                        'b' => Version::TwoB,
                        'x' => Version::TwoX,
                        'y' => Version::TwoY,
                        _ => return Err(Error::InvalidHash("Unsupported hash version")),
                    };

                    state = HashStates::VersionComplete;
                }

                HashStates::VersionComplete => {
                    state = match c {
                        '$' => HashStates::CostFirstDigit,
                        _ => return Err(Error::InvalidHash("Missing '$' delimiter")),
                    };
                }

                HashStates::CostFirstDigit => {
                    if !c.is_ascii_digit() {
                        return Err(Error::InvalidHash("Cost must be two digits"));
                    }

                    cost = i..(i + 1);
                    state = HashStates::CostSecondDigit;
                }

                HashStates::CostSecondDigit => {
                    if !c.is_ascii_digit() {
                        return Err(Error::InvalidHash("Cost must be two digits"));
                    }

                    cost.end += 1;
                    state = HashStates::CostComplete;
                }

                HashStates::CostComplete => {
                    state = match c {
                        '$' => HashStates::Salt,
                        _ => return Err(Error::InvalidHash("Missing '$' delimiter")),
                    };
                }

                HashStates::Salt => {
                    if c == '$' {
                        return Err(Error::InvalidHash("Unexpected '$' in salt"));
                    }

                    salt.push(c);

                    if salt.len() == B64_SALT_LEN {
                        state = HashStates::Hash;
                    }
                }

                HashStates::Hash => {
                    if c == '$' {
                        return Err(Error::InvalidHash("Unexpected '$' in hash"));
                    }

                    hash.push(c);
                }
            }
        }

        if std::mem::discriminant(&state) != std::mem::discriminant(&HashStates::Hash) {
            return Err(Error::InvalidHash("Hash is incomplete"));
        }

        if hash.len() != B64_HASH_LEN {
            return Err(Error::InvalidHash("Hash has an invalid length"));
        }

        let cost: u32 = match s[cost].parse() {
            Ok(c) => c,
            Err(_) => return Err(Error::InvalidHash("Invalid cost")),
        };

        Ok(Self {
            version,
            cost,
            b64_salt: salt,
            b64_hash: hash,
        })
    }
}
