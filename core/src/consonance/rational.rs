use std::fmt;

use crate::helpers::ratio_to_semitones;

/// A frequency ratio `numerator/denominator`.
///
/// The candidates built by the dissonance table are already in lowest terms,
/// as every prime power of a number ends up wholly on one side of the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: u32,
    denominator: u32,
}

impl Rational {
    pub const UNISON: Rational = Rational {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: u32, denominator: u32) -> Self {
        Rational {
            numerator,
            denominator,
        }
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The relative frequency, `numerator / denominator`.
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// The roughness of the ratio, `numerator * denominator`.
    pub fn dissonance(&self) -> u64 {
        self.numerator as u64 * self.denominator as u64
    }

    /// Position of the ratio on the 12-TET axis, relative to the unison.
    pub fn semitones(&self) -> f64 {
        ratio_to_semitones(self.value())
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
