//! Index windows over remote collections
//!
//! A view addresses records by *index* (position inside the view) while the
//! server addresses them by *offset* (position inside the filtered module
//! listing). An [`IndexRange`] maps one onto the other. It behaves like an
//! arithmetic progression with an exclusive end, and slicing it with a
//! [`Slice`] follows the usual sequence slicing rules: bounds are clamped,
//! negative bounds count from the end and a negative step walks backwards.

use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use zucker_core::{Result, ZuckerError};

/// Arithmetic progression `start, start + step, ...` stopping before `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
	start: i64,
	stop: i64,
	step: i64,
}

impl IndexRange {
	/// Creates a range, rejecting a zero step
	pub fn new(start: i64, stop: i64, step: i64) -> Result<Self> {
		if step == 0 {
			return Err(ZuckerError::Validation("range step cannot be zero".to_string()));
		}
		Ok(Self { start, stop, step })
	}

	/// `0, 1, ..., size - 1`
	pub fn full(size: usize) -> Self {
		Self {
			start: 0,
			stop: i64::try_from(size).unwrap_or(i64::MAX),
			step: 1,
		}
	}

	pub fn start(&self) -> i64 {
		self.start
	}

	pub fn stop(&self) -> i64 {
		self.stop
	}

	pub fn step(&self) -> i64 {
		self.step
	}

	pub fn len(&self) -> usize {
		let (low, high, step) = if self.step > 0 {
			(self.start, self.stop, self.step)
		} else {
			(self.stop, self.start, -self.step)
		};
		if low >= high {
			return 0;
		}
		usize::try_from((high - low - 1) / step + 1).unwrap_or(usize::MAX)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Element at `index`, counting from zero
	pub fn get(&self, index: usize) -> Option<i64> {
		if index >= self.len() {
			return None;
		}
		Some(self.start + i64::try_from(index).ok()? * self.step)
	}

	/// Position of `value` inside the range
	pub fn index_of(&self, value: i64) -> Option<usize> {
		let distance = value - self.start;
		if distance % self.step != 0 {
			return None;
		}
		let index = usize::try_from(distance / self.step).ok()?;
		(index < self.len()).then_some(index)
	}

	/// Sub-range selected by `slice`
	pub fn slice(&self, slice: Slice) -> Result<Self> {
		let (start, stop, step) = slice.indices(self.len())?;
		Ok(Self {
			start: self.start + start * self.step,
			stop: self.start + stop * self.step,
			step: self.step * step,
		})
	}

	/// Offsets in window order
	pub fn iter(&self) -> Offsets {
		Offsets {
			range: *self,
			next: 0,
		}
	}
}

/// Iterator over the elements of an [`IndexRange`]
#[derive(Debug, Clone)]
pub struct Offsets {
	range: IndexRange,
	next: usize,
}

impl Iterator for Offsets {
	type Item = i64;

	fn next(&mut self) -> Option<i64> {
		let value = self.range.get(self.next)?;
		self.next += 1;
		Some(value)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.range.len().saturating_sub(self.next);
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Offsets {}

/// Slice bounds as written in `[start:stop:step]`
///
/// Missing parts take their defaults once the length of the sliced sequence
/// is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
	pub start: Option<i64>,
	pub stop: Option<i64>,
	pub step: Option<i64>,
}

impl Slice {
	pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
		Self { start, stop, step }
	}

	/// `[::-1]`
	pub fn reversed() -> Self {
		Self::new(None, None, Some(-1))
	}

	pub fn with_step(mut self, step: i64) -> Self {
		self.step = Some(step);
		self
	}

	/// Resolves the slice against a sequence of `len` elements
	///
	/// Returns clamped `(start, stop, step)` values.
	pub fn indices(&self, len: usize) -> Result<(i64, i64, i64)> {
		let step = self.step.unwrap_or(1);
		if step == 0 {
			return Err(ZuckerError::Validation("slice step cannot be zero".to_string()));
		}
		let len = i64::try_from(len).unwrap_or(i64::MAX);
		let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };

		let clamp = |bound: i64| {
			if bound < 0 {
				(bound + len).max(lower)
			} else {
				bound.min(upper)
			}
		};
		let start = self
			.start
			.map_or(if step < 0 { upper } else { lower }, clamp);
		let stop = self
			.stop
			.map_or(if step < 0 { lower } else { upper }, clamp);
		Ok((start, stop, step))
	}
}

impl From<Range<i64>> for Slice {
	fn from(range: Range<i64>) -> Self {
		Self::new(Some(range.start), Some(range.end), None)
	}
}

impl From<RangeFrom<i64>> for Slice {
	fn from(range: RangeFrom<i64>) -> Self {
		Self::new(Some(range.start), None, None)
	}
}

impl From<RangeTo<i64>> for Slice {
	fn from(range: RangeTo<i64>) -> Self {
		Self::new(None, Some(range.end), None)
	}
}

impl From<RangeFull> for Slice {
	fn from(_: RangeFull) -> Self {
		Self::default()
	}
}

fn write_bound(f: &mut fmt::Formatter<'_>, bound: Option<i64>) -> fmt::Result {
	match bound {
		Some(value) => write!(f, "{value}"),
		None => Ok(()),
	}
}

impl fmt::Display for Slice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write_bound(f, self.start)?;
		f.write_str(":")?;
		write_bound(f, self.stop)?;
		if let Some(step) = self.step {
			write!(f, ":{step}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	/// Reference model: slicing a plain vector the way Python does
	///
	/// Bounds are worked out here from the slicing rules alone.
	fn model_slice(items: &[i64], slice: Slice) -> Vec<i64> {
		let len = i64::try_from(items.len()).unwrap();
		let step = slice.step.unwrap_or(1);
		let (low, high) = if step > 0 { (0, len) } else { (-1, len - 1) };
		let clamp = |bound: Option<i64>, default: i64| match bound {
			None => default,
			Some(value) if value < 0 => (value + len).clamp(low, high),
			Some(value) => value.clamp(low, high),
		};
		let start = clamp(slice.start, if step > 0 { 0 } else { len - 1 });
		let stop = clamp(slice.stop, if step > 0 { len } else { -1 });

		let mut out = Vec::new();
		let mut i = start;
		while (step > 0 && i < stop) || (step < 0 && i > stop) {
			out.push(items[usize::try_from(i).unwrap()]);
			i += step;
		}
		out
	}

	#[rstest]
	#[case(Slice::from(-3..), 10, (7, 10, 1))]
	#[case(Slice::from(-30..30), 10, (0, 10, 1))]
	#[case(Slice::from(-30..30).with_step(-1), 10, (-1, 9, -1))]
	#[case(Slice::from(30..-30).with_step(-2), 10, (9, -1, -2))]
	#[case(Slice::from(-2..-30).with_step(-1), 10, (8, -1, -1))]
	#[case(Slice::from(..-12), 10, (0, 0, 1))]
	#[case(Slice::reversed(), 10, (9, -1, -1))]
	#[case(Slice::reversed(), 0, (-1, -1, -1))]
	#[case(Slice::from(5..), 0, (0, 0, 1))]
	#[case(Slice::new(Some(-1), None, Some(-3)), 7, (6, -1, -3))]
	fn test_indices_clamp_bounds(
		#[case] slice: Slice,
		#[case] len: usize,
		#[case] expected: (i64, i64, i64),
	) {
		assert_eq!(slice.indices(len).unwrap(), expected);
	}

	#[rstest]
	#[case(Slice::from(0..5), vec![0, 1, 2, 3, 4])]
	#[case(Slice::from(9..14), vec![9, 10, 11, 12])]
	#[case(Slice::from(5..2), vec![])]
	#[case(Slice::from(2..5).with_step(-1), vec![])]
	#[case(Slice::from(7..1).with_step(-1), vec![7, 6, 5, 4, 3, 2])]
	#[case(Slice::reversed(), vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0])]
	#[case(Slice::from(-3..), vec![10, 11, 12])]
	#[case(Slice::from(..-10), vec![0, 1, 2])]
	#[case(Slice::new(None, None, Some(5)), vec![0, 5, 10])]
	fn test_slicing_thirteen_elements(#[case] slice: Slice, #[case] expected: Vec<i64>) {
		let range = IndexRange::full(13).slice(slice).unwrap();

		assert_eq!(range.iter().collect::<Vec<_>>(), expected);
		assert_eq!(range.len(), expected.len());
	}

	#[rstest]
	fn test_chained_slices_compose() {
		// Arrange
		let range = IndexRange::full(13);

		// Act
		let composed = range
			.slice(Slice::from(2..))
			.and_then(|r| r.slice(Slice::reversed()))
			.and_then(|r| r.slice(Slice::from(1..4)))
			.unwrap();

		// Assert
		assert_eq!(composed.iter().collect::<Vec<_>>(), vec![11, 10, 9]);
	}

	#[rstest]
	fn test_index_lookup() {
		let range = IndexRange::new(10, 0, -3).unwrap();

		assert_eq!(range.iter().collect::<Vec<_>>(), vec![10, 7, 4, 1]);
		assert_eq!(range.get(2), Some(4));
		assert_eq!(range.get(4), None);
		assert_eq!(range.index_of(7), Some(1));
		assert_eq!(range.index_of(8), None);
		assert_eq!(range.index_of(-2), None);
	}

	#[rstest]
	fn test_zero_step_is_rejected() {
		assert!(IndexRange::new(0, 1, 0).unwrap_err().is_validation());
		assert!(
			IndexRange::full(3)
				.slice(Slice::new(None, None, Some(0)))
				.unwrap_err()
				.is_validation()
		);
	}

	#[rstest]
	#[case(Slice::from(2..5), "2:5")]
	#[case(Slice::reversed(), "::-1")]
	#[case(Slice::from(..), ":")]
	#[case(Slice::from(3..), "3:")]
	fn test_slice_display(#[case] slice: Slice, #[case] expected: &str) {
		assert_eq!(slice.to_string(), expected);
	}

	fn slice_strategy() -> impl Strategy<Value = Slice> {
		let bound = prop::option::of(-20i64..20);
		let step = prop::option::of(prop_oneof![-4i64..=-1, 1i64..=4]);
		(bound.clone(), bound, step).prop_map(|(start, stop, step)| Slice::new(start, stop, step))
	}

	proptest! {
		#[test]
		fn prop_range_slicing_matches_vector_slicing(
			size in 0usize..30,
			first in slice_strategy(),
			second in slice_strategy(),
		) {
			let items: Vec<i64> = (0..i64::try_from(size).unwrap()).collect();
			let expected = model_slice(&model_slice(&items, first), second);

			let range = IndexRange::full(size).slice(first).unwrap().slice(second).unwrap();

			prop_assert_eq!(range.iter().collect::<Vec<_>>(), expected.clone());
			prop_assert_eq!(range.len(), expected.len());
			for (index, offset) in expected.iter().enumerate() {
				prop_assert_eq!(range.index_of(*offset), Some(index));
			}
		}

		#[test]
		fn prop_reversed_is_exact_reverse(size in 0usize..30, slice in slice_strategy()) {
			let range = IndexRange::full(size).slice(slice).unwrap();
			let mut forward: Vec<i64> = range.iter().collect();
			forward.reverse();

			let backward: Vec<i64> = range.slice(Slice::reversed()).unwrap().iter().collect();

			prop_assert_eq!(backward, forward);
		}
	}
}
