use std::ops::Index;

use log::{debug, info};
use to_vec::ToVec;

use super::{ConsonanceInitError, Rational};

/// Dissonance of two notes on the 12-TET grid by their distance in semitones.
///
/// Every rational number n/d with n*d <= maxfrac is a point at
/// (x = 12*log2(n/d), y = n*d) on the semitone/dissonance plane. Each point gets
/// fuzzified by a bell curve on the log-frequency axis, and the entry for a
/// distance is the lowest of all the fuzzified curves at that distance.
///
/// The curve is symmetric, so only non-negative distances are stored. Index 0 is
/// the unison and always holds the global minimum of 1.
#[derive(Debug, Clone)]
pub struct DissonanceTable {
    values: Box<[f64]>,
    best_fits: Box<[Rational]>,
    maxfrac: u32,
    bell_width: f64,
}

impl DissonanceTable {
    /// Builds the table for the distances `0..notecount`.
    ///
    /// `maxfrac` bounds the dissonance (numerator * denominator) of the rationals taken
    /// into account, values below 1 are treated as 1. Build time grows with it, 157 is
    /// a good tradeoff.
    ///
    /// `bell_width` is the width of the bell curve around each rational, in semitones.
    /// The wider it is, the further a rational reaches from its exact pitch.
    pub fn new(
        notecount: usize,
        maxfrac: u32,
        bell_width: f64,
    ) -> Result<DissonanceTable, ConsonanceInitError> {
        if notecount == 0 {
            return Err(ConsonanceInitError::EmptyNoteRange);
        }
        if !bell_width.is_finite() || bell_width <= 0.0 {
            return Err(ConsonanceInitError::InvalidBellWidth(bell_width));
        }
        let maxfrac = maxfrac.max(1);

        info!(
            "Calculating dissonances for {} note distances with a maximum fraction dissonance of {} and a bell width of {}",
            notecount, maxfrac, bell_width
        );

        let rationals = candidate_rationals(maxfrac);

        let (values, best_fits): (Vec<f64>, Vec<Rational>) = (0..notecount)
            .map(|distance| {
                let (rational, dissonance) = best_fit_at(&rationals, distance, bell_width);
                debug!("{} - {} - {}", distance, rational, dissonance);
                (dissonance, rational)
            })
            .unzip();

        Ok(DissonanceTable {
            values: values.into_boxed_slice(),
            best_fits: best_fits.into_boxed_slice(),
            maxfrac,
            bell_width,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The dissonance for the given (absolute) distance in semitones.
    #[inline(always)]
    pub fn get(&self, distance: usize) -> Option<f64> {
        self.values.get(distance).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The rational which produced the entry at the given distance.
    pub fn best_fit(&self, distance: usize) -> Option<Rational> {
        self.best_fits.get(distance).copied()
    }

    pub fn maxfrac(&self) -> u32 {
        self.maxfrac
    }

    pub fn bell_width(&self) -> f64 {
        self.bell_width
    }
}

impl Index<usize> for DissonanceTable {
    type Output = f64;

    #[inline(always)]
    fn index(&self, distance: usize) -> &f64 {
        &self.values[distance]
    }
}

/// The dissonance of a rational, spread by a bell curve, seen from `distance` semitones.
fn bell_score(rational: &Rational, distance: usize, bell_width: f64) -> f64 {
    let offset = distance as f64 - rational.semitones();
    rational.dissonance() as f64 * (offset * offset / (2.0 * bell_width * bell_width)).exp()
}

fn best_fit_at(rationals: &[Rational], distance: usize, bell_width: f64) -> (Rational, f64) {
    let mut min_dissonance = f64::INFINITY;
    let mut min_rational = Rational::UNISON;

    for rational in rationals {
        let dissonance = bell_score(rational, distance, bell_width);
        if dissonance < min_dissonance {
            min_dissonance = dissonance;
            min_rational = *rational;
        }
    }

    // Far away distances overflow the bell curve of every candidate
    (min_rational, min_dissonance.min(f64::MAX))
}

/// All primes in `[2, upto]`, by trial division against the primes found so far.
pub(crate) fn primes_up_to(upto: u32) -> Vec<u32> {
    let mut primes = Vec::new();
    if upto < 2 {
        return primes;
    }

    primes.push(2);
    for candidate in (3..=upto).step_by(2) {
        let is_prime = primes
            .iter()
            .take_while(|&&p| p as u64 * p as u64 <= candidate as u64)
            .all(|&p| candidate % p != 0);
        if is_prime {
            primes.push(candidate);
        }
    }

    primes
}

/// Factorizes `num`, multiplying equal primes back together.
/// So 300 results in `[4, 3, 25]` rather than `[2, 2, 3, 5, 5]`.
///
/// `primes` must contain all primes up to `num`. Returns an empty list for `num <= 1`.
pub(crate) fn combined_factorization(num: u32, primes: &[u32]) -> Vec<u32> {
    let mut factors = Vec::new();
    if num <= 1 {
        return factors;
    }

    let mut rest = num;
    for &prime in primes {
        let mut power = 1;
        while rest % prime == 0 {
            rest /= prime;
            power *= prime;
        }
        if power != 1 {
            factors.push(power);
        }
        if rest == 1 {
            break;
        }
    }

    factors
}

/// Every way of putting each factor either above or below the fraction bar.
/// An empty factor list still results in 1/1.
pub(crate) fn fraction_splits(factors: &[u32]) -> Vec<Rational> {
    // 2^k rationals for k factors, with k far below the mask width for any u32
    debug_assert!(factors.len() < u32::BITS as usize);

    (0..1u64 << factors.len())
        .map(|mask| {
            let mut numerator = 1;
            let mut denominator = 1;
            for (place, &factor) in factors.iter().enumerate() {
                if mask & (1 << place) != 0 {
                    numerator *= factor;
                } else {
                    denominator *= factor;
                }
            }
            Rational::new(numerator, denominator)
        })
        .to_vec()
}

/// All rationals with `numerator * denominator` in `[1, maxfrac]`, in lowest terms.
pub(crate) fn candidate_rationals(maxfrac: u32) -> Vec<Rational> {
    let maxfrac = maxfrac.max(1);
    let primes = primes_up_to(maxfrac);

    (1..=maxfrac)
        .flat_map(|num| fraction_splits(&combined_factorization(num, &primes)))
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primes() {
        assert!(primes_up_to(0).is_empty());
        assert!(primes_up_to(1).is_empty());
        assert_eq!(primes_up_to(2), vec![2]);
        assert_eq!(primes_up_to(30), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(primes_up_to(157).last(), Some(&157));
    }

    #[test]
    fn test_combined_factorization() {
        let primes = primes_up_to(300);
        assert_eq!(combined_factorization(300, &primes), vec![4, 3, 25]);
        assert_eq!(combined_factorization(97, &primes), vec![97]);
        assert_eq!(combined_factorization(64, &primes), vec![64]);
        assert!(combined_factorization(1, &primes).is_empty());
        assert!(combined_factorization(0, &primes).is_empty());
    }

    #[test]
    fn test_fraction_splits() {
        assert_eq!(fraction_splits(&[]), vec![Rational::UNISON]);
        assert_eq!(
            fraction_splits(&[4, 3]),
            vec![
                Rational::new(1, 12),
                Rational::new(4, 3),
                Rational::new(3, 4),
                Rational::new(12, 1),
            ]
        );
        assert_eq!(fraction_splits(&[4, 3, 25]).len(), 8);
    }

    #[test]
    fn test_candidate_rationals() {
        // 1 + 2 * 4 (for 2, 3, 4, 5) + 4 (for 6 = 2 * 3)
        let rationals = candidate_rationals(6);
        assert_eq!(rationals.len(), 13);
        assert_eq!(rationals[0], Rational::UNISON);
        assert!(rationals.contains(&Rational::new(3, 2)));
        assert!(rationals.contains(&Rational::new(2, 3)));
        assert!(rationals.iter().all(|r| r.dissonance() <= 6));

        assert_eq!(candidate_rationals(0), vec![Rational::UNISON]);
    }

    #[test]
    fn test_unison_is_most_consonant() {
        let table = DissonanceTable::new(13, 157, 0.35).unwrap();
        assert_eq!(table.len(), 13);
        assert_eq!(table[0], 1.0);
        assert_eq!(table.best_fit(0), Some(Rational::UNISON));
        for distance in 1..table.len() {
            assert!(
                table[0] < table[distance],
                "distance {} is not more dissonant than the unison",
                distance
            );
        }
    }

    #[test]
    fn test_known_intervals() {
        let table = DissonanceTable::new(13, 157, 0.35).unwrap();

        assert_eq!(table[12], 2.0);
        assert_eq!(table.best_fit(12), Some(Rational::new(2, 1)));

        assert_eq!(table.best_fit(7), Some(Rational::new(3, 2)));
        assert!((table[7] - 6.0).abs() < 0.02);

        // The fifth is more consonant than the tritone and the semitone
        assert!(table[7] < table[6]);
        assert!(table[7] < table[1]);
    }

    #[test]
    fn test_prefix_of_longer_table() {
        let short = DissonanceTable::new(12, 157, 0.35).unwrap();
        let long = DissonanceTable::new(13, 157, 0.35).unwrap();
        assert_eq!(short.values(), &long.values()[..12]);
    }

    #[test]
    fn test_more_candidates_never_increase_dissonance() {
        let small = DissonanceTable::new(25, 16, 0.35).unwrap();
        let large = DissonanceTable::new(25, 157, 0.35).unwrap();
        for distance in 0..25 {
            assert!(large[distance] <= small[distance]);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            DissonanceTable::new(0, 157, 0.35),
            Err(ConsonanceInitError::EmptyNoteRange)
        ));
        assert!(matches!(
            DissonanceTable::new(13, 157, 0.0),
            Err(ConsonanceInitError::InvalidBellWidth(_))
        ));
        assert!(matches!(
            DissonanceTable::new(13, 157, -1.0),
            Err(ConsonanceInitError::InvalidBellWidth(_))
        ));
        assert!(matches!(
            DissonanceTable::new(13, 157, f64::NAN),
            Err(ConsonanceInitError::InvalidBellWidth(_))
        ));
    }

    #[test]
    fn test_maxfrac_is_clamped() {
        let table = DissonanceTable::new(3, 0, 1.0).unwrap();
        assert_eq!(table.maxfrac(), 1);
        assert_eq!(table[0], 1.0);
        assert!((table[2] - 2f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_overflowing_entries_saturate() {
        let table = DissonanceTable::new(88, 1, 0.25).unwrap();
        assert_eq!(table[87], f64::MAX);
        assert!(table.values().iter().all(|v| v.is_finite()));
    }
}
