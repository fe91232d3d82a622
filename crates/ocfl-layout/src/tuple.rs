//! Shared n-tuple helpers.

use crate::error::{LayoutError, LayoutResult};

/// Largest accepted tuple size and tuple count.
pub(crate) const MAX_TUPLE_PARAM: usize = 32;

/// Clamp both parameters to [`MAX_TUPLE_PARAM`]; if either is zero, both are.
pub(crate) fn normalize(tuple_size: usize, number_of_tuples: usize) -> (usize, usize) {
    let size = tuple_size.min(MAX_TUPLE_PARAM);
    let count = number_of_tuples.min(MAX_TUPLE_PARAM);
    if size == 0 || count == 0 {
        (0, 0)
    } else {
        (size, count)
    }
}

/// Reject tuple parameters that need more characters than `available`.
pub(crate) fn check_span(
    tuple_size: usize,
    number_of_tuples: usize,
    available: usize,
    strict: bool,
) -> LayoutResult<()> {
    let span = tuple_size * number_of_tuples;
    let fits = if strict { span < available } else { span <= available };
    if fits {
        Ok(())
    } else {
        Err(LayoutError::Configuration(format!(
            "{number_of_tuples} tuples of {tuple_size} characters do not fit in {available} characters"
        )))
    }
}

/// Cut the leading `tuple_size * number_of_tuples` characters of an ASCII
/// string into segments.
pub(crate) fn split(value: &str, tuple_size: usize, number_of_tuples: usize) -> Vec<&str> {
    (0..number_of_tuples)
        .map(|i| &value[i * tuple_size..(i + 1) * tuple_size])
        .collect()
}
