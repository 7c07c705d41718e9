//! Index searches over 1-D arrays.
//!
//! Both searches scan in ascending index order and keep the first hit, so ties
//! always resolve to the lowest index. Coordinate resolution depends on this
//! for reproducible cell assignment.

/// Index of the axis value closest to `value`.
///
/// Returns `None` for an empty axis or a non-finite `value`. When several
/// entries are equidistant the first one (lowest index) wins.
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, &coord) in axis.iter().enumerate() {
        let dist = (coord - value).abs();
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ if dist.is_nan() => {}
            _ => best = Some((idx, dist)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Index of the maximum value (first one on ties). `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate() {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ if v.is_nan() => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_index_exact_match() {
        let axis = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(nearest_index(&axis, 0.3), Some(2));
        assert_eq!(nearest_index(&axis, 0.1), Some(0));
    }

    #[test]
    fn nearest_index_ties_pick_lower_index() {
        let axis = [1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&axis, 1.5), Some(0));
        assert_eq!(nearest_index(&axis, 2.5), Some(1));
    }

    #[test]
    fn nearest_index_outside_axis_clamps_to_edges() {
        let axis = [1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&axis, -10.0), Some(0));
        assert_eq!(nearest_index(&axis, 99.0), Some(2));
    }

    #[test]
    fn nearest_index_rejects_non_finite_and_empty() {
        assert_eq!(nearest_index(&[1.0], f64::NAN), None);
        assert_eq!(nearest_index(&[1.0], f64::INFINITY), None);
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn argmax_first_on_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.0, 0.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
