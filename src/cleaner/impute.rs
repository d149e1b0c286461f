//! Fill values for missing cells

use std::collections::HashMap;

use crate::table::CellValue;

/// Median of the non-null numbers in a column
pub fn median(values: &[CellValue]) -> Option<f64> {
    let mut numbers: Vec<f64> = values
        .iter()
        .filter_map(CellValue::as_f64)
        .filter(|f| !f.is_nan())
        .collect();
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(|a, b| a.total_cmp(b));

    let mid = numbers.len() / 2;
    Some(if numbers.len() % 2 == 0 {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    } else {
        numbers[mid]
    })
}

/// Most frequent non-null value; ties go to the smallest value
pub fn mode(values: &[CellValue]) -> Option<CellValue> {
    let mut counts: HashMap<&CellValue, usize> = HashMap::new();
    for value in values.iter().filter(|v| !v.is_null()) {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(value, _)| value.clone())
}
