use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Running first and second moments of a single observable.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulator {
    name: String,
    count: u64,
    sum: f64,
    sum2: f64,
}

impl Accumulator {
    /// Make an empty accumulator.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            count: 0,
            sum: 0.0,
            sum2: 0.0,
        }
    }

    /// Record a measurement.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum2 += value * value;
    }

    /// Name of the observable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of measurements.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean, NaN if nothing was measured.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    /// Variance of the measurements.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        let mean = self.mean();
        (self.sum2 / self.count as f64 - mean * mean).max(0.0)
    }

    /// Standard error of the mean assuming uncorrelated samples, NaN below two measurements.
    pub fn error(&self) -> f64 {
        if self.count < 2 {
            f64::NAN
        } else {
            (self.variance() / (self.count - 1) as f64).sqrt()
        }
    }
}

impl Display for Accumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} +- {}", self.name, self.mean(), self.error())
    }
}

/// A named collection of accumulators, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ObservableSet {
    accumulators: Vec<Accumulator>,
}

impl ObservableSet {
    /// Make an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measurement of `name`, creating the accumulator on first use.
    pub fn push(&mut self, name: &str, value: f64) {
        match self.accumulators.iter_mut().find(|acc| acc.name == name) {
            Some(acc) => acc.push(value),
            None => {
                let mut acc = Accumulator::new(name);
                acc.push(value);
                self.accumulators.push(acc);
            }
        }
    }

    /// Look up an accumulator by name.
    pub fn get(&self, name: &str) -> Option<&Accumulator> {
        self.accumulators.iter().find(|acc| acc.name == name)
    }

    /// Mean of `name` if it has been measured.
    pub fn mean(&self, name: &str) -> Option<f64> {
        self.get(name).map(Accumulator::mean)
    }

    /// Iterate over the accumulators.
    pub fn iter(&self) -> impl Iterator<Item = &Accumulator> {
        self.accumulators.iter()
    }

    /// Number of distinct observables.
    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    /// Check if nothing has been measured.
    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Binder ratio `<m^2>^2 / <m^4>` from two accumulated moments.
    pub fn binder_ratio(&self, m2: &str, m4: &str) -> Option<f64> {
        let m2 = self.mean(m2)?;
        let m4 = self.mean(m4)?;
        Some(m2 * m2 / m4)
    }

    /// Specific heat `beta^2 (<E^2> - <E>^2) / N` from the total energy and its square.
    pub fn specific_heat(&self, beta: f64, nsites: usize) -> Option<f64> {
        let e = self.mean("Energy")?;
        let e2 = self.mean("Energy^2")?;
        Some(beta * beta * (e2 - e * e) / nsites as f64)
    }
}

impl Display for ObservableSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.accumulators.iter().join("\n"))
    }
}

#[cfg(test)]
mod observable_tests {
    use super::*;

    #[test]
    fn test_moments() {
        let mut acc = Accumulator::new("x");
        [1.0, 2.0, 3.0, 4.0].iter().for_each(|v| acc.push(*v));
        assert_eq!(acc.count(), 4);
        assert!((acc.mean() - 2.5).abs() < 1e-12);
        assert!((acc.variance() - 1.25).abs() < 1e-12);
        assert!((acc.error() - (1.25f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        let acc = Accumulator::new("x");
        assert!(acc.mean().is_nan());
        assert!(acc.error().is_nan());
    }

    #[test]
    fn test_set_keeps_order() {
        let mut obs = ObservableSet::new();
        obs.push("b", 1.0);
        obs.push("a", 2.0);
        obs.push("b", 3.0);
        let names = obs.iter().map(|a| a.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(obs.mean("b"), Some(2.0));
        assert!(obs.mean("c").is_none());
    }

    #[test]
    fn test_binder() {
        let mut obs = ObservableSet::new();
        obs.push("m2", 2.0);
        obs.push("m4", 8.0);
        assert_eq!(obs.binder_ratio("m2", "m4"), Some(0.5));
    }

    #[test]
    fn test_display() {
        let mut obs = ObservableSet::new();
        obs.push("Energy", 1.0);
        assert_eq!(obs.to_string(), "Energy = 1 +- NaN");
    }
}
