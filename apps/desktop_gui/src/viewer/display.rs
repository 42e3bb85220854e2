//! Brightness, contrast, zoom, and rotation applied to the current frame.
//!
//! Brightness and contrast are integer percentages with 100 as neutral,
//! applied to pixels through a 256-entry lookup table in the order the
//! original viewer applied them (brightness first, then contrast around the
//! midpoint). Zoom and rotation are geometric and never touch pixels.

pub const ADJUST_MIN: i32 = 0;
pub const ADJUST_MAX: i32 = 200;
pub const ADJUST_NEUTRAL: i32 = 100;

pub const ZOOM_MIN: f32 = 0.25;
pub const ZOOM_MAX: f32 = 4.0;
const ZOOM_STEP: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub brillo: i32,
    pub contraste: i32,
    pub zoom: f32,
    pub rotacion_deg: f32,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self {
            brillo: ADJUST_NEUTRAL,
            contraste: ADJUST_NEUTRAL,
            zoom: 1.0,
            rotacion_deg: 0.0,
        }
    }
}

impl DisplayTransform {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Rotates 90 degrees clockwise, wrapping within [0, 360).
    pub fn rotate_right(&mut self) {
        self.rotacion_deg = (self.rotacion_deg + 90.0).rem_euclid(360.0);
    }

    /// Rotates 90 degrees counter-clockwise, wrapping within [0, 360).
    pub fn rotate_left(&mut self) {
        self.rotacion_deg = (self.rotacion_deg - 90.0).rem_euclid(360.0);
    }

    pub fn rotation_radians(&self) -> f32 {
        self.rotacion_deg.to_radians()
    }

    /// Lookup table mapping input luminance to adjusted luminance.
    /// Monotonic non-decreasing for any in-range parameters.
    pub fn lut(&self) -> [u8; 256] {
        let brightness = self.brillo as f32 / 100.0;
        let contrast = self.contraste as f32 / 100.0;
        let mut table = [0u8; 256];
        for (value, out) in table.iter_mut().enumerate() {
            let normalized = value as f32 / 255.0;
            let adjusted = (normalized * brightness - 0.5) * contrast + 0.5;
            *out = (adjusted.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        table
    }

    /// Applies the lookup table to RGBA pixels, leaving alpha alone.
    pub fn apply_to_rgba(&self, rgba: &[u8]) -> Vec<u8> {
        let lut = self.lut();
        let mut out = rgba.to_vec();
        for px in out.chunks_exact_mut(4) {
            px[0] = lut[px[0] as usize];
            px[1] = lut[px[1] as usize];
            px[2] = lut[px[2] as usize];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_lut_is_identity() {
        let lut = DisplayTransform::default().lut();
        for (value, out) in lut.iter().enumerate() {
            assert_eq!(*out as usize, value);
        }
    }

    #[test]
    fn lut_is_monotonic_for_any_parameters() {
        for brillo in [0, 40, 100, 160, 200] {
            for contraste in [0, 40, 100, 160, 200] {
                let transform = DisplayTransform {
                    brillo,
                    contraste,
                    ..DisplayTransform::default()
                };
                let lut = transform.lut();
                for pair in lut.windows(2) {
                    assert!(
                        pair[0] <= pair[1],
                        "lut not monotonic at brillo={brillo} contraste={contraste}"
                    );
                }
            }
        }
    }

    #[test]
    fn zero_brightness_blacks_out() {
        let transform = DisplayTransform {
            brillo: 0,
            ..DisplayTransform::default()
        };
        // brightness 0 pins the input at 0, contrast then centers on 0.0.
        let lut = transform.lut();
        assert!(lut.iter().all(|v| *v == 0));
    }

    #[test]
    fn contrast_extremes_saturate() {
        let transform = DisplayTransform {
            contraste: 200,
            ..DisplayTransform::default()
        };
        let lut = transform.lut();
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        assert_eq!(lut[128], 129); // midpoint barely moves
    }

    #[test]
    fn rotation_wraps_within_a_full_turn() {
        let mut transform = DisplayTransform::default();
        for _ in 0..4 {
            transform.rotate_right();
        }
        assert_eq!(transform.rotacion_deg, 0.0);

        transform.rotate_left();
        assert_eq!(transform.rotacion_deg, 270.0);
        transform.rotate_right();
        assert_eq!(transform.rotacion_deg, 0.0);
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut transform = DisplayTransform::default();
        for _ in 0..20 {
            transform.zoom_in();
        }
        assert_eq!(transform.zoom, ZOOM_MAX);
        for _ in 0..40 {
            transform.zoom_out();
        }
        assert_eq!(transform.zoom, ZOOM_MIN);
    }

    #[test]
    fn apply_preserves_alpha() {
        let transform = DisplayTransform {
            brillo: 0,
            ..DisplayTransform::default()
        };
        let out = transform.apply_to_rgba(&[200, 100, 50, 255, 10, 20, 30, 128]);
        assert_eq!(out, vec![0, 0, 0, 255, 0, 0, 0, 128]);
    }
}
