//! Zoom level for the live-view image

const ZOOM_STEP: f64 = 0.2;
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    level: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self { level: MIN_ZOOM }
    }
}

impl ZoomState {
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn zoom_in(&mut self) -> f64 {
        if self.level < MAX_ZOOM {
            self.level = snap(self.level + ZOOM_STEP).min(MAX_ZOOM);
        }
        self.level
    }

    pub fn zoom_out(&mut self) -> f64 {
        if self.level > MIN_ZOOM {
            self.level = snap(self.level - ZOOM_STEP).max(MIN_ZOOM);
        }
        self.level
    }

    pub fn reset(&mut self) -> f64 {
        self.level = MIN_ZOOM;
        self.level
    }

    /// CSS transform for the image, e.g. `scale(1.4)`
    pub fn transform(&self) -> String {
        format!("scale({:.1})", self.level)
    }
}

/// Round to tenths so repeated steps land exactly on the bounds
fn snap(level: f64) -> f64 {
    (level * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_bounds() {
        let mut zoom = ZoomState::default();
        assert_eq!(zoom.zoom_out(), 1.0);

        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert!((zoom.level() - 3.0).abs() < 1e-9);
        assert_eq!(zoom.transform(), "scale(3.0)");

        zoom.zoom_out();
        assert_eq!(zoom.transform(), "scale(2.8)");

        zoom.reset();
        assert_eq!(zoom.level(), 1.0);
    }

    #[test]
    fn test_ten_steps_land_exactly_on_max() {
        let mut zoom = ZoomState::default();
        for _ in 0..10 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.level(), 3.0);

        assert_eq!(zoom.zoom_in(), 3.0);
        for _ in 0..10 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.level(), 1.0);
    }

    #[test]
    fn test_steps() {
        let mut zoom = ZoomState::default();
        zoom.zoom_in();
        zoom.zoom_in();
        assert_eq!(zoom.transform(), "scale(1.4)");
    }
}
