//! Color-vision-deficiency simulation.
//!
//! The pipeline only depends on the [`CvdSimulator`] trait. The bundled
//! [`MachadoSimulator`] is a reference implementation; any third-party
//! simulator can be plugged in instead.
//!
//! # Reference
//! - Machado, Oliveira & Fernandes (2009), "A Physiologically-based Model for
//!   Simulation of Color Vision Deficiency", severity 1.0 matrices.

use glam::{Mat3, Vec3};
use palette::{LinSrgb, Srgb};

use crate::transform::params::Deficiency;

/// A deterministic per-pixel mapping from RGB to perceived RGB.
///
/// Implementations must be pure: the same input, class and severity always
/// produce the same output. Alpha is never passed to the simulator.
pub trait CvdSimulator: Send + Sync {
    /// Simulate a single sRGB pixel at `severity` in `[0, 1]`.
    fn simulate_pixel(&self, deficiency: Deficiency, severity: f32, rgb: [u8; 3]) -> [u8; 3];

    /// Simulate a row of RGBA pixels in place, leaving alpha untouched.
    fn simulate_row(&self, deficiency: Deficiency, severity: f32, row: &mut [[u8; 4]]) {
        for px in row {
            let [r, g, b] = self.simulate_pixel(deficiency, severity, [px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}

const PROTAN: [[f32; 3]; 3] = [
    [0.152286, 1.052583, -0.204868],
    [0.114503, 0.786281, 0.099216],
    [-0.003882, -0.048116, 1.051998],
];

const DEUTAN: [[f32; 3]; 3] = [
    [0.367322, 0.860646, -0.227968],
    [0.280085, 0.672501, 0.047413],
    [-0.011820, 0.042940, 0.968881],
];

const TRITAN: [[f32; 3]; 3] = [
    [1.255528, -0.076749, -0.178779],
    [-0.078411, 0.930809, 0.147602],
    [0.004733, 0.691367, 0.303900],
];

/// Linear-RGB matrix simulator.
///
/// Pixels are linearized, multiplied by `(1 − s)·I + s·M`, and re-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachadoSimulator;

impl MachadoSimulator {
    /// Row-major full-severity matrix for a class.
    pub fn full_matrix(deficiency: Deficiency) -> Mat3 {
        let rows = match deficiency {
            Deficiency::Protan => PROTAN,
            Deficiency::Deutan => DEUTAN,
            Deficiency::Tritan => TRITAN,
        };
        // `from_cols_array_2d` reads columns; transpose to get rows.
        Mat3::from_cols_array_2d(&rows).transpose()
    }

    /// Matrix blended with identity by `severity`.
    pub fn matrix(deficiency: Deficiency, severity: f32) -> Mat3 {
        let s = severity.clamp(0.0, 1.0);
        Mat3::IDENTITY * (1.0 - s) + Self::full_matrix(deficiency) * s
    }

    fn apply(m: &Mat3, [r, g, b]: [u8; 3]) -> [u8; 3] {
        let lin: LinSrgb<f32> = Srgb::new(r, g, b).into_format::<f32>().into_linear();
        let out = *m * Vec3::new(lin.red, lin.green, lin.blue);
        let lin = LinSrgb::new(
            out.x.clamp(0.0, 1.0),
            out.y.clamp(0.0, 1.0),
            out.z.clamp(0.0, 1.0),
        );
        let encoded: Srgb<f32> = Srgb::from_linear(lin);
        let encoded: Srgb<u8> = encoded.into_format();
        [encoded.red, encoded.green, encoded.blue]
    }
}

impl CvdSimulator for MachadoSimulator {
    fn simulate_pixel(&self, deficiency: Deficiency, severity: f32, rgb: [u8; 3]) -> [u8; 3] {
        if severity <= 0.0 {
            return rgb;
        }
        Self::apply(&Self::matrix(deficiency, severity), rgb)
    }

    fn simulate_row(&self, deficiency: Deficiency, severity: f32, row: &mut [[u8; 4]]) {
        if severity <= 0.0 {
            return;
        }
        let m = Self::matrix(deficiency, severity);
        for px in row {
            let [r, g, b] = Self::apply(&m, [px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}
