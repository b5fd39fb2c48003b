//! Arithmetic over JSON numbers that keeps integers integral.

use std::cmp::Ordering;

use serde_json::Number;

fn float(value: f64) -> Option<Number> {
    Number::from_f64(value)
}

fn as_f64(number: &Number) -> f64 {
    number.as_f64().unwrap_or(f64::NAN)
}

/// Sum of two numbers; `None` when the result is not finite.
pub(crate) fn add(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(sum.into());
        }
    }
    float(as_f64(a) + as_f64(b))
}

/// Product of two numbers; `None` when the result is not finite.
pub(crate) fn multiply(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(product) = x.checked_mul(y) {
            return Some(product.into());
        }
    }
    float(as_f64(a) * as_f64(b))
}

/// Count, sum, mean, min and max of a non-empty list.
pub(crate) struct Statistics {
    pub count: usize,
    pub sum: Number,
    pub mean: Number,
    pub min: Number,
    pub max: Number,
}

/// Computes [`Statistics`]; `None` for an empty list or a non-finite result.
pub(crate) fn statistics(numbers: &[Number]) -> Option<Statistics> {
    let (first, rest) = numbers.split_first()?;

    let mut sum = first.clone();
    let mut min = first;
    let mut max = first;
    for number in rest {
        sum = add(&sum, number)?;
        if compare(number, min) == Ordering::Less {
            min = number;
        }
        if compare(number, max) == Ordering::Greater {
            max = number;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = float(as_f64(&sum) / numbers.len() as f64)?;

    Some(Statistics {
        count: numbers.len(),
        sum,
        mean,
        min: min.clone(),
        max: max.clone(),
    })
}

fn compare(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    as_f64(a).partial_cmp(&as_f64(b)).unwrap_or(Ordering::Equal)
}
