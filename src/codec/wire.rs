use std::fmt;
use std::str::FromStr;

use crate::error::{RemoteError, RemoteResult};
use crate::index::{AxisTerm, IndexExpression, RangeTerm, check_steps};

/// Separator between per-axis terms on the wire.
pub const TERM_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// WireSlice
// ---------------------------------------------------------------------------

/// The canonical text form of an [`IndexExpression`], sent as the `slice_`
/// query parameter. The empty string selects everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WireSlice(String);

impl WireSlice {
    pub fn everything() -> Self {
        WireSlice(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_everything(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse back into the selection it denotes.
    pub fn to_expression(&self) -> RemoteResult<IndexExpression> {
        parse(&self.0)
    }
}

impl fmt::Display for WireSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WireSlice {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for WireSlice {
    type Err = RemoteError;

    /// Accepts only strings in the wire grammar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)?;
        Ok(WireSlice(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(crate) fn encode(expr: &IndexExpression) -> RemoteResult<WireSlice> {
    if expr.is_everything() {
        return Ok(WireSlice::everything());
    }
    let terms = expr.terms();
    check_steps(&terms)?;
    let parts: Vec<String> = terms.iter().map(render_term).collect();
    Ok(WireSlice(parts.join(TERM_SEPARATOR)))
}

fn render_term(term: &AxisTerm) -> String {
    match term {
        AxisTerm::Index(i) => i.to_string(),
        AxisTerm::Range(r) => format!("{}:{}", render_bound(r.start), render_bound(r.stop)),
    }
}

fn render_bound(bound: Option<i64>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse(s: &str) -> RemoteResult<IndexExpression> {
    if s.is_empty() {
        return Ok(IndexExpression::Everything);
    }
    let mut terms = s
        .split(TERM_SEPARATOR)
        .map(parse_term)
        .collect::<RemoteResult<Vec<_>>>()?;

    if terms.len() == 1 {
        return Ok(match terms.remove(0) {
            AxisTerm::Index(i) => IndexExpression::Scalar(i),
            AxisTerm::Range(r) => IndexExpression::Range(r),
        });
    }
    Ok(IndexExpression::Tuple(terms))
}

fn parse_term(term: &str) -> RemoteResult<AxisTerm> {
    match term.split_once(':') {
        None => parse_int(term)
            .map(AxisTerm::Index)
            .ok_or_else(|| bad_term(term)),
        Some((start, stop)) => {
            if stop.contains(':') {
                return Err(bad_term(term));
            }
            let start = parse_bound(start).ok_or_else(|| bad_term(term))?;
            let stop = parse_bound(stop).ok_or_else(|| bad_term(term))?;
            Ok(AxisTerm::Range(RangeTerm::new(start, stop)))
        }
    }
}

/// `Some(None)` for an open bound, `None` if the text is not an integer.
fn parse_bound(s: &str) -> Option<Option<i64>> {
    if s.is_empty() {
        Some(None)
    } else {
        parse_int(s).map(Some)
    }
}

/// A decimal integer with an optional leading minus and nothing else.
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn bad_term(term: &str) -> RemoteError {
    RemoteError::UnsupportedIndex(format!("Malformed slice term: {term:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(expr: impl Into<IndexExpression>) -> String {
        encode(&expr.into()).unwrap().into_string()
    }

    #[test]
    fn everything_encodes_to_empty_string() {
        assert_eq!(enc(IndexExpression::all()), "");
        assert_eq!(enc(()), "");
        assert_eq!(enc(..), "");
        assert_eq!(enc(RangeTerm::full().with_step(1)), "");
    }

    #[test]
    fn terms_render_in_axis_order() {
        assert_eq!(enc(5i64), "5");
        assert_eq!(enc(-2i64), "-2");
        assert_eq!(enc(10i64..30), "10:30");
        assert_eq!(enc(10i64..), "10:");
        assert_eq!(enc(..30i64), ":30");
        assert_eq!(enc(0i64..4), "0:4");
        assert_eq!(enc((1i64, 2i64..3, ..4i64)), "1, 2:3, :4");
    }

    #[test]
    fn full_range_inside_tuple_is_not_collapsed() {
        assert_eq!(enc((..,)), ":");
        assert_eq!(enc((.., 3i64)), ":, 3");
    }

    #[test]
    fn non_unit_step_is_unsupported() {
        for step in [0, 2, -1] {
            let expr = IndexExpression::from(RangeTerm::new(Some(0), Some(10)).with_step(step));
            assert!(matches!(
                encode(&expr),
                Err(RemoteError::UnsupportedIndex(_))
            ));
            let expr = IndexExpression::from((AxisTerm::Index(1), RangeTerm::full().with_step(step)));
            assert!(matches!(
                encode(&expr),
                Err(RemoteError::UnsupportedIndex(_))
            ));
        }
    }

    #[test]
    fn parse_reconstructs_encoded_terms() {
        let cases: Vec<IndexExpression> = vec![
            IndexExpression::scalar(7),
            IndexExpression::from(3i64..9),
            IndexExpression::from(..9i64),
            IndexExpression::from(-4i64..),
            IndexExpression::from((2i64, 0i64..5)),
            IndexExpression::from((.., -1i64, 4i64..)),
            IndexExpression::from((1i64, 2i64, 3i64, 4i64)),
        ];
        for expr in cases {
            let wire = encode(&expr).unwrap();
            let back = wire.to_expression().unwrap();
            assert_eq!(back.terms(), expr.terms(), "wire string {wire:?}");
        }
    }

    #[test]
    fn parse_of_empty_string_is_everything() {
        assert_eq!(
            WireSlice::everything().to_expression().unwrap(),
            IndexExpression::Everything
        );
    }

    #[test]
    fn parse_rejects_strings_outside_the_grammar() {
        for bad in ["1,2", " 1", "1 ", "1:2:3", "a", "1, ", ", 1", "+1", "1:x", "-", "1,  2"] {
            assert!(
                matches!(bad.parse::<WireSlice>(), Err(RemoteError::UnsupportedIndex(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!("1, 2:, :3, :".parse::<WireSlice>().is_ok());
    }
}
