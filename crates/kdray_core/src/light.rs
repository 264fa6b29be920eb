//! Point lights.

use kdray_math::Vec3;

/// Calibration pair for light falloff: a light of `power` is considered to
/// deliver unit intensity at `distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightReference {
    pub power: f64,
    pub distance: f64,
}

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub power: f64,
    pub reference: LightReference,
}

impl Light {
    pub fn new(position: Vec3, power: f64, reference: LightReference) -> Self {
        Self {
            position,
            power,
            reference,
        }
    }

    /// Power scaled by the reference calibration, before distance falloff.
    ///
    /// `power / (reference.distance / reference.power)`
    pub fn calibrated_power(&self) -> f64 {
        self.power / (self.reference.distance / self.reference.power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrated_power() {
        let light = Light::new(
            Vec3::ZERO,
            8.0,
            LightReference {
                power: 2.0,
                distance: 4.0,
            },
        );
        assert_eq!(light.calibrated_power(), 4.0);
    }
}
