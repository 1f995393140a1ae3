//! Colour Scales Module
//! Continuous colour scales shared by the interactive and static maps.

use egui::Color32;

/// Missing-data fill for prefectures without a table row.
pub const NO_DATA_RGB: (u8, u8, u8) = (200, 200, 200);

const VIRIDIS: [(u8, u8, u8); 10] = [
    (68, 1, 84),
    (72, 40, 120),
    (62, 73, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (110, 206, 88),
    (181, 222, 43),
    (253, 231, 37),
];

const THERMAL: [(u8, u8, u8); 11] = [
    (3, 35, 51),
    (15, 49, 105),
    (63, 51, 159),
    (103, 67, 150),
    (138, 82, 140),
    (176, 95, 129),
    (213, 107, 108),
    (242, 130, 76),
    (251, 165, 60),
    (246, 208, 69),
    (231, 250, 90),
];

const SUNSET: [(u8, u8, u8); 7] = [
    (243, 231, 155),
    (250, 196, 132),
    (248, 160, 126),
    (235, 127, 134),
    (206, 102, 147),
    (160, 89, 160),
    (92, 83, 165),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    Viridis,
    Thermal,
    Sunset,
}

impl ColorScale {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Thermal => &THERMAL,
            ColorScale::Sunset => &SUNSET,
        }
    }

    /// Colour at position `t` in [0, 1], linearly interpolated between stops.
    pub fn rgb_at(self, t: f64) -> (u8, u8, u8) {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = scaled.floor() as usize;
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = scaled - lower as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (stops[lower], stops[upper]);
        (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    pub fn color32(self, t: f64) -> Color32 {
        let (r, g, b) = self.rgb_at(t);
        Color32::from_rgb(r, g, b)
    }
}

/// Value range mapped onto a colour scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
}

impl ColorRange {
    /// Position of `value` in [0, 1]; a degenerate range maps to 0.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_first_and_last_stop() {
        assert_eq!(ColorScale::Viridis.rgb_at(0.0), VIRIDIS[0]);
        assert_eq!(ColorScale::Viridis.rgb_at(1.0), VIRIDIS[9]);
        assert_eq!(ColorScale::Thermal.rgb_at(1.0), THERMAL[10]);
        assert_eq!(ColorScale::Sunset.rgb_at(0.0), SUNSET[0]);
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        assert_eq!(ColorScale::Sunset.rgb_at(-3.0), SUNSET[0]);
        assert_eq!(ColorScale::Sunset.rgb_at(7.0), SUNSET[6]);
        assert_eq!(ColorScale::Sunset.rgb_at(f64::NAN), SUNSET[0]);
    }

    #[test]
    fn interpolates_between_stops() {
        assert_eq!(ColorScale::Sunset.rgb_at(1.0 / 6.0), SUNSET[1]);

        let (r, g, b) = ColorScale::Sunset.rgb_at(0.3 / 6.0);
        let (a, z) = (SUNSET[0], SUNSET[1]);
        assert!(r > a.0 && r < z.0);
        assert!(g < a.1 && g > z.1);
        assert!(b < a.2 && b > z.2);
    }

    #[test]
    fn range_position() {
        let range = ColorRange { min: 1.0, max: 5.0 };
        assert_eq!(range.position(1.0), 0.0);
        assert_eq!(range.position(3.0), 0.5);
        assert_eq!(range.position(9.0), 1.0);
        assert_eq!(ColorRange { min: 0.0, max: 0.0 }.position(4.0), 0.0);
    }
}
