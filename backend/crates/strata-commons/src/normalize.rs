//! Value normalization.
//!
//! Stores return numbers boxed ([`AttributeValue::Boxed`]). These helpers walk a
//! value of any depth and replace each boxed leaf with the plain number it holds.
//! Lists and maps are rewritten in place; null, dates, strings, booleans and
//! plain numbers are left untouched. A boxed value whose text is not a number
//! stays boxed.

use crate::models::{AttributeValue, Item};

/// Returns `value` with every boxed number unwrapped.
///
/// A boxed number at the top level is replaced, not mutated, so always use the
/// returned value.
pub fn unwrap_numbers(mut value: AttributeValue) -> AttributeValue {
    unwrap_numbers_in_place(&mut value);
    value
}

/// Unwraps boxed numbers in place.
pub fn unwrap_numbers_in_place(value: &mut AttributeValue) {
    match value {
        AttributeValue::Boxed(boxed) => {
            if let Some(n) = boxed.value_of() {
                *value = AttributeValue::Number(n);
            }
        }
        AttributeValue::List(values) => {
            for v in values.iter_mut() {
                unwrap_numbers_in_place(v);
            }
        }
        AttributeValue::Map(item) => unwrap_item_numbers(item),
        _ => {}
    }
}

/// Unwraps boxed numbers in every attribute of an item.
pub fn unwrap_item_numbers(item: &mut Item) {
    for v in item.values_mut() {
        unwrap_numbers_in_place(v);
    }
}
