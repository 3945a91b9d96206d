use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Face value of a six-sided die. Always in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieValue(u8);

impl DieValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub const ALL: [DieValue; 6] = [
        DieValue(1),
        DieValue(2),
        DieValue(3),
        DieValue(4),
        DieValue(5),
        DieValue(6),
    ];

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(DieValue(value))
        } else {
            None
        }
    }

    /// Uniform draw over the six faces.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        DieValue(rng.gen_range(Self::MIN..=Self::MAX))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn points(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u8> for DieValue {
    type Error = InvalidDieValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DieValue::new(value).ok_or(InvalidDieValue(value))
    }
}

impl From<DieValue> for u8 {
    fn from(value: DieValue) -> Self {
        value.0
    }
}

impl fmt::Display for DieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDieValue(pub u8);

impl fmt::Display for InvalidDieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "die value {} is outside 1..=6", self.0)
    }
}

impl std::error::Error for InvalidDieValue {}
