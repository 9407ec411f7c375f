//! Indexing expressions accepted by [`RemoteArray::get`](crate::RemoteArray::get).

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{RemoteError, RemoteResult};

// ---------------------------------------------------------------------------
// RangeTerm
// ---------------------------------------------------------------------------

/// A half-open range over one axis. Open bounds are `None`; negative bounds
/// count from the end of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RangeTerm {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl RangeTerm {
    pub fn new(start: Option<i64>, stop: Option<i64>) -> Self {
        Self {
            start,
            stop,
            step: None,
        }
    }

    /// The range covering the whole axis.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn with_step(self, step: i64) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    pub fn has_unit_step(&self) -> bool {
        matches!(self.step, None | Some(1))
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.stop.is_none() && self.has_unit_step()
    }
}

impl From<Range<i64>> for RangeTerm {
    fn from(r: Range<i64>) -> Self {
        RangeTerm::new(Some(r.start), Some(r.end))
    }
}

impl From<RangeFrom<i64>> for RangeTerm {
    fn from(r: RangeFrom<i64>) -> Self {
        RangeTerm::new(Some(r.start), None)
    }
}

impl From<RangeTo<i64>> for RangeTerm {
    fn from(r: RangeTo<i64>) -> Self {
        RangeTerm::new(None, Some(r.end))
    }
}

impl From<RangeFull> for RangeTerm {
    fn from(_: RangeFull) -> Self {
        RangeTerm::full()
    }
}

// ---------------------------------------------------------------------------
// AxisTerm
// ---------------------------------------------------------------------------

/// The selection applied to a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisTerm {
    Index(i64),
    Range(RangeTerm),
}

impl From<i64> for AxisTerm {
    fn from(i: i64) -> Self {
        AxisTerm::Index(i)
    }
}

impl From<RangeTerm> for AxisTerm {
    fn from(r: RangeTerm) -> Self {
        AxisTerm::Range(r)
    }
}

impl From<Range<i64>> for AxisTerm {
    fn from(r: Range<i64>) -> Self {
        AxisTerm::Range(r.into())
    }
}

impl From<RangeFrom<i64>> for AxisTerm {
    fn from(r: RangeFrom<i64>) -> Self {
        AxisTerm::Range(r.into())
    }
}

impl From<RangeTo<i64>> for AxisTerm {
    fn from(r: RangeTo<i64>) -> Self {
        AxisTerm::Range(r.into())
    }
}

impl From<RangeFull> for AxisTerm {
    fn from(r: RangeFull) -> Self {
        AxisTerm::Range(r.into())
    }
}

// ---------------------------------------------------------------------------
// IndexExpression
// ---------------------------------------------------------------------------

/// A selection over a remote array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IndexExpression {
    /// Select the whole array.
    #[default]
    Everything,
    /// A single position on axis 0.
    Scalar(i64),
    /// A range on axis 0.
    Range(RangeTerm),
    /// One term per leading axis; trailing axes are selected in full.
    Tuple(Vec<AxisTerm>),
}

impl IndexExpression {
    pub fn all() -> Self {
        IndexExpression::Everything
    }

    pub fn scalar(index: i64) -> Self {
        IndexExpression::Scalar(index)
    }

    pub fn range(start: Option<i64>, stop: Option<i64>) -> Self {
        IndexExpression::Range(RangeTerm::new(start, stop))
    }

    pub fn tuple<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AxisTerm>,
    {
        IndexExpression::Tuple(terms.into_iter().map(Into::into).collect())
    }

    /// True for every form that selects the whole array without naming an
    /// axis: `Everything`, an empty tuple, or a bare full-open range.
    pub fn is_everything(&self) -> bool {
        match self {
            IndexExpression::Everything => true,
            IndexExpression::Tuple(terms) => terms.is_empty(),
            IndexExpression::Range(r) => r.is_full(),
            IndexExpression::Scalar(_) => false,
        }
    }

    /// The per-axis terms, with a single term normalised to a one-element
    /// sequence.
    pub fn terms(&self) -> Vec<AxisTerm> {
        match self {
            IndexExpression::Everything => Vec::new(),
            IndexExpression::Scalar(i) => vec![AxisTerm::Index(*i)],
            IndexExpression::Range(r) => vec![AxisTerm::Range(*r)],
            IndexExpression::Tuple(terms) => terms.clone(),
        }
    }

    /// Check the expression against an array with `ndim` axes.
    pub fn validate(&self, ndim: usize) -> RemoteResult<()> {
        let terms = self.terms();
        if terms.len() > ndim {
            return Err(RemoteError::UnsupportedIndex(format!(
                "{} terms given for an array with {ndim} dimensions",
                terms.len()
            )));
        }
        check_steps(&terms)
    }
}

/// Only unit steps can be expressed on the wire.
pub(crate) fn check_steps(terms: &[AxisTerm]) -> RemoteResult<()> {
    for (axis, term) in terms.iter().enumerate() {
        if let AxisTerm::Range(r) = term {
            if !r.has_unit_step() {
                return Err(RemoteError::UnsupportedIndex(format!(
                    "Only step=1 is supported, got step={} on axis {axis}",
                    r.step.unwrap_or_default()
                )));
            }
        }
    }
    Ok(())
}

impl From<i64> for IndexExpression {
    fn from(i: i64) -> Self {
        IndexExpression::Scalar(i)
    }
}

impl From<RangeTerm> for IndexExpression {
    fn from(r: RangeTerm) -> Self {
        IndexExpression::Range(r)
    }
}

impl From<Range<i64>> for IndexExpression {
    fn from(r: Range<i64>) -> Self {
        IndexExpression::Range(r.into())
    }
}

impl From<RangeFrom<i64>> for IndexExpression {
    fn from(r: RangeFrom<i64>) -> Self {
        IndexExpression::Range(r.into())
    }
}

impl From<RangeTo<i64>> for IndexExpression {
    fn from(r: RangeTo<i64>) -> Self {
        IndexExpression::Range(r.into())
    }
}

impl From<RangeFull> for IndexExpression {
    fn from(r: RangeFull) -> Self {
        IndexExpression::Range(r.into())
    }
}

impl From<Vec<AxisTerm>> for IndexExpression {
    fn from(terms: Vec<AxisTerm>) -> Self {
        IndexExpression::Tuple(terms)
    }
}

impl From<()> for IndexExpression {
    fn from(_: ()) -> Self {
        IndexExpression::Tuple(Vec::new())
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<AxisTerm>),+> From<($($name,)+)> for IndexExpression {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                IndexExpression::Tuple(vec![$($name.into()),+])
            }
        }
    };
}

impl_from_tuple!(A);
impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_forms() {
        assert!(IndexExpression::all().is_everything());
        assert!(IndexExpression::from(()).is_everything());
        assert!(IndexExpression::from(..).is_everything());
        assert!(IndexExpression::Range(RangeTerm::full().with_step(1)).is_everything());
        assert!(!IndexExpression::tuple([..]).is_everything());
        assert!(!IndexExpression::scalar(0).is_everything());
        assert!(!IndexExpression::Range(RangeTerm::full().with_step(2)).is_everything());
    }

    #[test]
    fn tuples_convert_term_by_term() {
        let expr = IndexExpression::from((3i64, 10i64..20, ..));
        assert_eq!(
            expr,
            IndexExpression::Tuple(vec![
                AxisTerm::Index(3),
                AxisTerm::Range(RangeTerm::new(Some(10), Some(20))),
                AxisTerm::Range(RangeTerm::full()),
            ])
        );
    }

    #[test]
    fn validate_rejects_too_many_terms() {
        let expr = IndexExpression::from((1i64, 2i64));
        assert!(expr.validate(2).is_ok());
        assert!(matches!(
            expr.validate(1),
            Err(RemoteError::UnsupportedIndex(_))
        ));
    }

    #[test]
    fn validate_rejects_non_unit_step() {
        let expr = IndexExpression::from(RangeTerm::new(Some(0), Some(10)).with_step(2));
        assert!(matches!(
            expr.validate(1),
            Err(RemoteError::UnsupportedIndex(_))
        ));
        let expr = IndexExpression::from(RangeTerm::new(Some(0), Some(10)).with_step(1));
        assert!(expr.validate(1).is_ok());
    }
}
