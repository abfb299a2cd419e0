use anyhow::Result;

/// Sorted, finite samples. Construction rejects empty input, NaNs and
/// infinities so every accessor below is total.
#[derive(Debug, Clone)]
pub struct Samples {
    sorted: Vec<f64>,
}

impl Samples {
    pub fn new(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            anyhow::bail!("cannot summarize an empty sample set");
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            anyhow::bail!("sample is not finite (index={idx}, value={})", values[idx]);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self { sorted })
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    pub fn mean(&self) -> f64 {
        self.sorted.iter().sum::<f64>() / self.sorted.len() as f64
    }

    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// Percentile with linear interpolation between the two closest ranks.
    /// `p` is clamped to `[0, 100]`.
    pub fn percentile(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 100.0);
        let rank = p / 100.0 * (self.sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let frac = rank - lower as f64;

        self.sorted[lower] + (self.sorted[upper] - self.sorted[lower]) * frac
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&Samples> for Summary {
    fn from(samples: &Samples) -> Self {
        Summary {
            count: samples.len(),
            min: samples.min(),
            p25: samples.percentile(25.0),
            median: samples.median(),
            p75: samples.percentile(75.0),
            p90: samples.percentile(90.0),
            p95: samples.percentile(95.0),
            p99: samples.percentile(99.0),
            max: samples.max(),
            mean: samples.mean(),
        }
    }
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        Ok(Summary::from(&Samples::new(values)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_interpolates() {
        let samples = Samples::new(&[4.0, 1.0, 3.0, 2.0]).unwrap();

        assert!(close(samples.percentile(0.0), 1.0));
        assert!(close(samples.percentile(100.0), 4.0));
        // rank = 0.5 * 3 = 1.5
        assert!(close(samples.median(), 2.5));
        // rank = 0.9 * 3 = 2.7
        assert!(close(samples.percentile(90.0), 3.7));
    }

    #[test]
    fn test_single_sample() {
        let summary = Summary::from_values(&[2.5]).unwrap();

        assert_eq!(summary.count, 1);
        assert!(close(summary.min, 2.5));
        assert!(close(summary.p99, 2.5));
        assert!(close(summary.mean, 2.5));
    }

    #[test]
    fn test_summary_odd_count() {
        let summary = Summary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert!(close(summary.median, 3.0));
        assert!(close(summary.p25, 2.0));
        assert!(close(summary.p75, 4.0));
        assert!(close(summary.mean, 3.0));
        assert!(close(summary.min, 1.0));
        assert!(close(summary.max, 5.0));
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert!(Samples::new(&[]).is_err());
        assert!(Samples::new(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_rejects_infinite_samples() {
        let err = Samples::new(&[1.0, f64::INFINITY]).unwrap_err();
        assert!(err.to_string().contains("index=1"));
        assert!(Samples::new(&[f64::NEG_INFINITY, 2.0]).is_err());
        assert!(Summary::from_values(&[3.0, f64::INFINITY]).is_err());
    }
}
