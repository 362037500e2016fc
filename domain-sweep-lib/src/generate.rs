//! Candidate domain generation.
//!
//! Candidates are every string of a fixed length over an alphabet, joined to a
//! suffix: with the default alphabet and length 2, `"im"` yields `00.im`,
//! `01.im`, ... `zz.im` (1296 names).
//!
//! # Examples
//!
//! ```
//! use domain_sweep_lib::generate::{generate_candidates, Alphabet};
//!
//! let alphabet = Alphabet::custom("ab").unwrap();
//! let names = generate_candidates(&alphabet, 2, ".im").unwrap();
//! assert_eq!(names, vec!["aa.im", "ab.im", "ba.im", "bb.im"]);
//! ```

use crate::error::SweepError;

/// Ordered, duplicate-free set of characters a candidate label is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Digits then lowercase letters: `0-9a-z`.
    pub fn alphanumeric() -> Self {
        Self {
            chars: ('0'..='9').chain('a'..='z').collect(),
        }
    }

    /// Lowercase letters only: `a-z`.
    pub fn letters() -> Self {
        Self {
            chars: ('a'..='z').collect(),
        }
    }

    pub fn with_digits(digits: bool) -> Self {
        if digits {
            Self::alphanumeric()
        } else {
            Self::letters()
        }
    }

    /// Alphabet from an explicit character list, lowercased and de-duplicated
    /// in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::InvalidGeneration` if the list is empty or holds
    /// anything other than ASCII letters and digits.
    pub fn custom(chars: &str) -> Result<Self, SweepError> {
        let mut alphabet = Vec::new();
        for ch in chars.chars() {
            if !ch.is_ascii_alphanumeric() {
                return Err(SweepError::invalid_generation(format!(
                    "alphabet character '{}' is not an ASCII letter or digit",
                    ch
                )));
            }
            let ch = ch.to_ascii_lowercase();
            if !alphabet.contains(&ch) {
                alphabet.push(ch);
            }
        }

        if alphabet.is_empty() {
            return Err(SweepError::invalid_generation("alphabet cannot be empty"));
        }
        Ok(Self { chars: alphabet })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::alphanumeric()
    }
}

/// Normalize a suffix: trim, strip one leading dot, lowercase.
///
/// # Errors
///
/// Returns `SweepError::InvalidDomain` for an empty suffix or one containing
/// whitespace.
pub fn normalize_suffix(suffix: &str) -> Result<String, SweepError> {
    let trimmed = suffix.trim();
    let normalized = trimmed.strip_prefix('.').unwrap_or(trimmed).to_lowercase();

    if normalized.is_empty() {
        return Err(SweepError::invalid_domain(suffix, "suffix cannot be empty"));
    }
    if normalized.chars().any(char::is_whitespace) {
        return Err(SweepError::invalid_domain(
            suffix,
            "suffix cannot contain whitespace",
        ));
    }
    Ok(normalized)
}

/// Number of candidates `generate_candidates` would produce for one suffix.
/// Saturates at `usize::MAX`.
pub fn estimate_candidate_count(alphabet: &Alphabet, length: usize) -> usize {
    let mut count: usize = 1;
    for _ in 0..length {
        count = count.saturating_mul(alphabet.len());
    }
    count
}

/// Largest candidate set a single run may generate.
pub const MAX_CANDIDATES: usize = 10_000_000;

/// Number of candidates across `suffix_count` suffixes. Saturates at
/// `usize::MAX`.
pub fn estimate_total(alphabet: &Alphabet, length: usize, suffix_count: usize) -> usize {
    estimate_candidate_count(alphabet, length).saturating_mul(suffix_count)
}

/// Reject a candidate count above [`MAX_CANDIDATES`] before anything is
/// allocated.
pub fn ensure_within_limit(total: usize) -> Result<(), SweepError> {
    if total > MAX_CANDIDATES {
        return Err(SweepError::invalid_generation(format!(
            "{} candidates exceeds the limit of {}; use a shorter length, a smaller alphabet or fewer suffixes",
            if total == usize::MAX {
                "too many".to_string()
            } else {
                total.to_string()
            },
            MAX_CANDIDATES
        )));
    }
    Ok(())
}

/// Every label of `length` characters over `alphabet`, suffixed with
/// `.<suffix>`.
///
/// Labels come out in odometer order, rightmost character fastest.
pub fn generate_candidates(
    alphabet: &Alphabet,
    length: usize,
    suffix: &str,
) -> Result<Vec<String>, SweepError> {
    if length == 0 {
        return Err(SweepError::invalid_generation(
            "length must be at least 1",
        ));
    }
    if alphabet.is_empty() {
        return Err(SweepError::invalid_generation("alphabet cannot be empty"));
    }
    let suffix = normalize_suffix(suffix)?;

    let total = estimate_candidate_count(alphabet, length);
    ensure_within_limit(total)?;
    let mut names = Vec::with_capacity(total.min(1_000_000));
    let mut counters = vec![0usize; length];
    let radix = alphabet.len();

    loop {
        let mut name: String = counters.iter().map(|&i| alphabet.chars[i]).collect();
        name.push('.');
        name.push_str(&suffix);
        names.push(name);

        // Increment odometer (rightmost first); stop once every digit wraps.
        let mut position = length;
        loop {
            if position == 0 {
                return Ok(names);
            }
            position -= 1;
            counters[position] += 1;
            if counters[position] < radix {
                break;
            }
            counters[position] = 0;
        }
    }
}

/// Candidates for several suffixes, concatenated in suffix order.
///
/// Fails without generating anything when the combined count exceeds
/// [`MAX_CANDIDATES`].
pub fn generate_for_suffixes(
    alphabet: &Alphabet,
    length: usize,
    suffixes: &[String],
) -> Result<Vec<String>, SweepError> {
    ensure_within_limit(estimate_total(alphabet, length, suffixes.len()))?;
    let mut names = Vec::new();
    for suffix in suffixes {
        names.extend(generate_candidates(alphabet, length, suffix)?);
    }
    Ok(names)
}
