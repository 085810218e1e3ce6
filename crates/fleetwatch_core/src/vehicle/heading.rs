use std::fmt::Display;

/// Compass heading in degrees, normalized into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Heading(f64);

impl Heading {
    pub const NORTH: Heading = Heading(0.0);

    pub fn new(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Heading::NORTH;
        }

        let normalized = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if normalized >= 360.0 {
            Heading::NORTH
        } else {
            Heading(normalized)
        }
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Heading {
    fn from(degrees: f64) -> Self {
        Heading::new(degrees)
    }
}

impl Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}°", self.0)
    }
}
