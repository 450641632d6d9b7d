//! parsing — text records to rank individuals.
//!
//! Purpose
//! -------
//! Convert textual rank observations into [`RankIndividual`]s. A record is a
//! delimiter-separated list of position tokens:
//!
//! - an integer `v`: the item `v − min_modality` is observed at the position;
//! - `?`: nothing is known about the position;
//! - `{a b …}`: the item is one of the listed values (any separator inside
//!   the braces); a single value is treated as observed.
//!
//! Key behaviors
//! -------------
//! - The number of positions is taken from the first record.
//! - Problems in a record (unparsable token, interval syntax `[a:b]`,
//!   out-of-range item, wrong token count, contradictory constraints) are
//!   appended to a warning log and the record is skipped; parsing carries on.
//! - Each warning is also emitted through `tracing::warn!`.
use std::fmt::Write as _;

use regex::Regex;
use tracing::warn;

use crate::isr::{
    core::observation::{ObservationPattern, PositionConstraint},
    errors::RankError,
    models::individual::RankIndividual,
};

/// Default token delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Errors that abort parsing altogether.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parsed individuals with the accumulated warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRanks {
    pub individuals: Vec<RankIndividual>,
    /// Index in the input of each kept individual.
    pub record_indices: Vec<usize>,
    pub nb_positions: usize,
    /// Newline-separated warnings; empty when every record parsed.
    pub warnings: String,
}

/// Reusable parser holding the compiled token patterns.
#[derive(Debug, Clone)]
pub struct RankParser {
    min_modality: i64,
    delimiter: char,
    value: Regex,
    missing: Regex,
    finite_values: Regex,
    interval: Regex,
    number: Regex,
}

impl RankParser {
    pub fn new(min_modality: i64, delimiter: char) -> ParseResult<RankParser> {
        Ok(RankParser {
            min_modality,
            delimiter,
            value: Regex::new(r"^\s*(-?\d+)\s*$")?,
            missing: Regex::new(r"^\s*\?\s*$")?,
            finite_values: Regex::new(r"^\s*\{(.*)\}\s*$")?,
            interval: Regex::new(r"^\s*\[.*:.*\]\s*$")?,
            number: Regex::new(r"-?\d+")?,
        })
    }

    /// Parse every record; see the module documentation for the syntax.
    pub fn parse<S: AsRef<str>>(&self, records: &[S]) -> ParsedRanks {
        let mut parsed = ParsedRanks {
            individuals: Vec::new(),
            record_indices: Vec::new(),
            nb_positions: 0,
            warnings: String::new(),
        };
        let Some(first) = records.first() else {
            push_warning(&mut parsed.warnings, "No rank record provided.".to_string());
            return parsed;
        };
        parsed.nb_positions = self.split(first.as_ref()).len();

        for (idx, record) in records.iter().enumerate() {
            match self.parse_record(record.as_ref(), parsed.nb_positions) {
                Ok(ind) => {
                    parsed.individuals.push(ind);
                    parsed.record_indices.push(idx);
                }
                Err(reason) => push_warning(&mut parsed.warnings, format!("Record {idx}: {reason}")),
            }
        }
        parsed
    }

    fn split<'a>(&self, record: &'a str) -> Vec<&'a str> {
        record.split(self.delimiter).map(str::trim).collect()
    }

    fn parse_record(&self, record: &str, n: usize) -> Result<RankIndividual, String> {
        let tokens = self.split(record);
        if tokens.len() != n {
            return Err(format!("expected {n} positions, found {}.", tokens.len()));
        }
        let constraints = tokens
            .iter()
            .enumerate()
            .map(|(position, token)| self.parse_token(token, position, n))
            .collect::<Result<Vec<_>, _>>()?;
        let pattern = ObservationPattern::new(constraints).map_err(|e| e.to_string())?;
        RankIndividual::new(pattern).map_err(|e| match e {
            RankError::UnsatisfiableConstraints => {
                "constraints admit no completion (an item may be observed twice).".to_string()
            }
            other => other.to_string(),
        })
    }

    fn parse_token(&self, token: &str, position: usize, n: usize) -> Result<PositionConstraint, String> {
        if let Some(caps) = self.value.captures(token) {
            let item = self.to_item(&caps[1], position, n)?;
            return Ok(PositionConstraint::Present(item));
        }
        if self.missing.is_match(token) {
            return Ok(PositionConstraint::Missing);
        }
        if let Some(caps) = self.finite_values.captures(token) {
            let items = self
                .number
                .find_iter(&caps[1])
                .map(|m| self.to_item(m.as_str(), position, n))
                .collect::<Result<Vec<_>, _>>()?;
            return PositionConstraint::finite_values(position, items).map_err(|e| e.to_string());
        }
        if self.interval.is_match(token) {
            return Err(format!(
                "position {position}: interval \"{token}\" is not supported for ranks; list the values as {{a b ...}}."
            ));
        }
        Err(format!("position {position}: token \"{token}\" is not a value, ? or {{...}}."))
    }

    fn to_item(&self, text: &str, position: usize, n: usize) -> Result<usize, String> {
        let out_of_range = || {
            format!(
                "position {position}: value {text} outside [{}, {}].",
                self.min_modality,
                self.min_modality + n as i64 - 1
            )
        };
        let value: i64 = text.parse().map_err(|_| out_of_range())?;
        let shifted = value.checked_sub(self.min_modality).ok_or_else(out_of_range)?;
        usize::try_from(shifted).ok().filter(|&item| item < n).ok_or_else(out_of_range)
    }
}

fn push_warning(log: &mut String, message: String) {
    warn!(%message, "rank parsing");
    let _ = writeln!(log, "{message}");
}

/// Parse rank records with a one-off [`RankParser`].
///
/// Parameters
/// ----------
/// - `records`: one string per individual.
/// - `min_modality`: value of the first item in the text (e.g. 1 for
///   1-based labels).
/// - `delimiter`: token separator, [`DEFAULT_DELIMITER`] in most inputs.
pub fn parse_rank_strs<S: AsRef<str>>(records: &[S], min_modality: i64, delimiter: char) -> ParseResult<ParsedRanks> {
    Ok(RankParser::new(min_modality, delimiter)?.parse(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Each token kind maps to its constraint, with the offset removed.
    //
    // Given
    // -----
    // - 1-based records of size 4 mixing values, `?` and `{…}` sets.
    //
    // Expect
    // ------
    // - Two individuals, no warning; a single-value set becomes `Present`.
    fn token_kinds_map_to_constraints() {
        // Arrange
        let records = ["4, ?, {1 2}, 3", "{2}, {1 3;4}, ?, ?"];

        // Act
        let parsed = parse_rank_strs(&records, 1, ',').unwrap();

        // Assert
        assert_eq!(parsed.warnings, "");
        assert_eq!(parsed.nb_positions, 4);
        assert_eq!(parsed.record_indices, vec![0, 1]);
        assert_eq!(
            parsed.individuals[0].constraints().constraints(),
            &[
                PositionConstraint::Present(3),
                PositionConstraint::Missing,
                PositionConstraint::MissingFiniteValues(vec![0, 1]),
                PositionConstraint::Present(2),
            ]
        );
        let second = parsed.individuals[1].constraints();
        assert_eq!(second.get(0), &PositionConstraint::Present(1));
        assert_eq!(second.get(1), &PositionConstraint::MissingFiniteValues(vec![0, 2, 3]));
    }

    #[test]
    // Purpose
    // -------
    // Faulty records are skipped with one warning each.
    fn faulty_records_are_skipped_with_warnings() {
        // Arrange
        let records = [
            "0, 1, 2",     // ok
            "0, [1:2], ?", // interval
            "0, 1",        // wrong count
            "0, 3, ?",     // out of range
            "x, ?, ?",     // garbage
            "1, 1, ?",     // item observed twice
            "?, ?, {0 2}", // ok
        ];

        // Act
        let parsed = parse_rank_strs(&records, 0, DEFAULT_DELIMITER).unwrap();

        // Assert
        assert_eq!(parsed.record_indices, vec![0, 6]);
        assert_eq!(parsed.warnings.lines().count(), 5);
        assert!(parsed.warnings.contains("Record 1") && parsed.warnings.contains("interval"));
        assert!(parsed.warnings.contains("Record 3") && parsed.warnings.contains("outside [0, 2]"));
        assert!(parsed.warnings.contains("Record 5"));
    }

    #[test]
    fn empty_input_and_custom_delimiter() {
        let none: [&str; 0] = [];
        let parsed = parse_rank_strs(&none, 0, ',').unwrap();
        assert!(parsed.individuals.is_empty());
        assert!(!parsed.warnings.is_empty());

        let parsed = parse_rank_strs(&["2 | 0 | 1"], 0, '|').unwrap();
        assert_eq!(parsed.individuals[0].completed().ordering(), &[2, 0, 1]);
        assert!(parsed.individuals[0].is_all_present());
    }

    #[test]
    // Purpose
    // -------
    // Long records whose candidate sets sit on the last positions parse
    // directly, with the smallest consistent completion as starting value.
    //
    // Given
    // -----
    // - A 1-based record of size 14: twelve `?` then `{1 2}` twice.
    //
    // Expect
    // ------
    // - One individual, no warning, completion [2, 3, …, 13, 0, 1].
    fn trailing_candidate_sets_parse_on_long_records() {
        // Arrange
        let mut tokens = vec!["?"; 12];
        tokens.extend(["{1 2}", "{1 2}"]);
        let record = tokens.join(",");

        // Act
        let parsed = parse_rank_strs(&[record], 1, ',').unwrap();

        // Assert
        assert_eq!(parsed.warnings, "");
        assert_eq!(parsed.nb_positions, 14);
        let mut expected: Vec<usize> = (2..14).collect();
        expected.extend([0, 1]);
        assert_eq!(parsed.individuals[0].completed().ordering(), expected.as_slice());
    }
}
