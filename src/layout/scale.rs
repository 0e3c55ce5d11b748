/// Clamped linear map from data values to draw sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn range_min(&self) -> f32 {
        self.range.0.min(self.range.1)
    }

    pub fn range_max(&self) -> f32 {
        self.range.0.max(self.range.1)
    }

    pub fn apply(&self, value: f64) -> f32 {
        let (low, high) = self.domain;
        let span = high - low;
        if !value.is_finite() || !span.is_finite() || span == 0.0 {
            return self.range.0;
        }

        let t = ((value - low) / span).clamp(0.0, 1.0) as f32;
        self.range.0 + (self.range.1 - self.range.0) * t
    }

    /// Sizes never go negative; bad values draw at zero.
    pub fn size(&self, value: f64) -> f32 {
        if !value.is_finite() || value < 0.0 {
            return 0.0;
        }
        self.apply(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_and_clamps() {
        let scale = LinearScale::new((0.0, 100.0), (4.0, 24.0));
        assert_eq!(scale.apply(0.0), 4.0);
        assert_eq!(scale.apply(50.0), 14.0);
        assert_eq!(scale.apply(100.0), 24.0);
        assert_eq!(scale.apply(500.0), 24.0);
        assert_eq!(scale.apply(-10.0), 4.0);
    }

    #[test]
    fn bad_values_size_to_zero() {
        let scale = LinearScale::new((0.0, 100.0), (4.0, 24.0));
        assert_eq!(scale.size(-1.0), 0.0);
        assert_eq!(scale.size(f64::NAN), 0.0);
        assert_eq!(scale.size(f64::INFINITY), 0.0);
        assert_eq!(scale.size(25.0), 9.0);
    }

    #[test]
    fn degenerate_domain_uses_range_start() {
        let scale = LinearScale::new((0.0, 0.0), (2.0, 8.0));
        assert_eq!(scale.apply(0.0), 2.0);
        assert_eq!(scale.range_max(), 8.0);
    }
}
