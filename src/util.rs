pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// Rounds half away from zero. The feed's four-decimal figures were produced the same way.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_slice_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[0.25, 0.75]), Some(0.5));
        assert_eq!(mean(&[1.0]), Some(1.0));
    }

    #[test]
    fn rounding_to_four_places() {
        assert_eq!(round_to_places(0.123449, 4), 0.1234);
        assert_eq!(round_to_places(0.12346, 4), 0.1235);
        assert_eq!(round_to_places(0.5, 4), 0.5);
    }
}
