use serde::{Deserialize, Serialize};

/// Average travel speed in kilometers per hour.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Kmh(f64);

impl Kmh {
    pub fn new(value: f64) -> Self {
        Kmh(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Travel minutes needed to cover `km` at this speed.
    pub fn minutes_for(&self, km: f64) -> f64 {
        km / self.0 * 60.0
    }
}

impl Default for Kmh {
    fn default() -> Self {
        Kmh(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_for() {
        let speed = Kmh::new(30.0);
        assert_eq!(speed.minutes_for(30.0), 60.0);
        assert_eq!(speed.minutes_for(15.0), 30.0);
        assert_eq!(speed.minutes_for(0.0), 0.0);
    }

    #[test]
    fn test_default_speed() {
        assert_eq!(Kmh::default().value(), 30.0);
    }
}
