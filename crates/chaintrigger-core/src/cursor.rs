//! Query cursor — the "from block" position of the next pull.
//!
//! Block numbers are kept as [`BigUint`]: the wire format is an unbounded
//! hex quantity and the cursor never narrows it to a machine integer.

use std::str::FromStr;

use num_bigint::BigUint;

use crate::error::ManagerError;

/// Literal the nodes accept for "start from the current head".
pub const LATEST: &str = "latest";

/// The next block a manager will ask for.
///
/// Once the cursor holds a concrete block it only moves forward, and the
/// sentinels never come back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Nothing configured. Treated as [`Cursor::Latest`] on the wire.
    #[default]
    Unset,
    /// Start from the chain's current head.
    Latest,
    /// Query from this block (inclusive).
    Block(BigUint),
}

impl Cursor {
    /// Build a cursor pointing at `block`.
    pub fn at(block: impl Into<BigUint>) -> Self {
        Self::Block(block.into())
    }

    /// The concrete block number, if any.
    pub fn block(&self) -> Option<&BigUint> {
        match self {
            Self::Block(n) => Some(n),
            _ => None,
        }
    }

    /// The value placed in the query's "from" field.
    pub fn to_query_param(&self) -> String {
        match self {
            Self::Unset | Self::Latest => LATEST.to_string(),
            Self::Block(n) => encode_quantity(n),
        }
    }

    /// Move past an observed block.
    ///
    /// The candidate is `observed + 1`. It replaces a sentinel, or a concrete
    /// value strictly smaller than it. Returns `true` if the cursor moved.
    pub fn advance(&mut self, observed: &BigUint) -> bool {
        let candidate = observed + 1u32;
        self.raise_to(candidate)
    }

    /// Jump to the chain head reported by a health check.
    ///
    /// The cursor never moves backwards: a head below the current concrete
    /// position leaves it unchanged.
    pub fn bootstrap(&mut self, head: BigUint) -> bool {
        self.raise_to(head)
    }

    fn raise_to(&mut self, candidate: BigUint) -> bool {
        match self {
            Self::Block(current) if *current >= candidate => false,
            _ => {
                *self = Self::Block(candidate);
                true
            }
        }
    }
}

impl FromStr for Cursor {
    type Err = ManagerError;

    /// Accepts `""` (unset), `latest`, or a `0x` hex quantity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::Unset),
            v if v.eq_ignore_ascii_case(LATEST) => Ok(Self::Latest),
            v => decode_quantity(v).map(Self::Block),
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Latest => write!(f, "{LATEST}"),
            Self::Block(n) => write!(f, "{}", encode_quantity(n)),
        }
    }
}

/// Encode a quantity as lowercase `0x` hex without leading zeros (`0x0` for zero).
pub fn encode_quantity(n: &BigUint) -> String {
    format!("{n:#x}")
}

/// Decode a `0x`-prefixed hex quantity of any width.
pub fn decode_quantity(s: &str) -> Result<BigUint, ManagerError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| ManagerError::Decode(format!("quantity '{s}' is missing the 0x prefix")))?;
    if digits.is_empty() {
        return Err(ManagerError::Decode(format!("quantity '{s}' has no digits")));
    }
    // parse_bytes tolerates '_' separators and a leading '+'
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ManagerError::Decode(format!("quantity '{s}' is not valid hex")));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| ManagerError::Decode(format!("quantity '{s}' is not valid hex")))
}
