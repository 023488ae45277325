use tracing::debug;

use crate::error::CoreError;

pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.2;
pub const DEFAULT_MIN_SCALE: f64 = 0.4;

/// Stepped zoom scale with a lower bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    scale: f64,
    step: f64,
    min_scale: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            step: DEFAULT_ZOOM_STEP,
            min_scale: DEFAULT_MIN_SCALE,
        }
    }
}

impl Zoom {
    pub fn new(step: f64, min_scale: f64) -> crate::Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(CoreError::InvalidScale(step));
        }
        if min_scale <= 0.0 || !min_scale.is_finite() || min_scale > DEFAULT_SCALE {
            return Err(CoreError::InvalidScale(min_scale));
        }
        Ok(Self {
            scale: DEFAULT_SCALE,
            step,
            min_scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn zoom_in(&mut self) {
        self.scale = snap(self.scale + self.step);
        debug!(scale = self.scale, "Zoom in");
    }

    /// Step the scale down. Returns `false` and leaves the scale unchanged
    /// when the result would fall below the floor.
    pub fn zoom_out(&mut self) -> bool {
        let next = snap(self.scale - self.step);
        if next < self.min_scale {
            return false;
        }
        self.scale = next;
        debug!(scale = self.scale, "Zoom out");
        true
    }

    /// Back to 100 %.
    pub fn reset(&mut self) {
        self.scale = DEFAULT_SCALE;
    }

    /// Percentage label such as `"120%"`.
    pub fn label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }
}

// Repeated float steps drift (1.0 - 3 * 0.2 != 0.4); keep six decimals.
fn snap(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_hundred_percent() {
        let z = Zoom::default();
        assert_eq!(z.scale(), 1.0);
        assert_eq!(z.label(), "100%");
    }

    #[test]
    fn zoom_in_steps_up() {
        let mut z = Zoom::default();
        z.zoom_in();
        z.zoom_in();
        assert_eq!(z.scale(), 1.4);
        assert_eq!(z.label(), "140%");
    }

    #[test]
    fn zoom_out_reaches_floor_then_stops() {
        let mut z = Zoom::default();
        assert!(z.zoom_out());
        assert!(z.zoom_out());
        assert!(z.zoom_out());
        assert_eq!(z.scale(), 0.4);

        assert!(!z.zoom_out());
        assert_eq!(z.scale(), 0.4, "no-op at the floor");
        assert_eq!(z.label(), "40%");
    }

    #[test]
    fn zoom_out_never_crosses_floor() {
        let mut z = Zoom::new(0.2, 0.5).unwrap();
        assert!(z.zoom_out());
        assert!(z.zoom_out());
        assert_eq!(z.scale(), 0.6);
        assert!(!z.zoom_out());
        assert!(z.scale() >= z.min_scale());
    }

    #[test]
    fn reset_restores_default() {
        let mut z = Zoom::default();
        z.zoom_in();
        z.reset();
        assert_eq!(z.scale(), 1.0);
    }

    #[test]
    fn invalid_configuration() {
        assert!(Zoom::new(0.0, 0.4).is_err());
        assert!(Zoom::new(0.2, 0.0).is_err());
        assert!(Zoom::new(0.2, 1.5).is_err());
    }
}
