//! Color naming: map a normalized RGB triple to the closest reference color.
//!
//! Classification never fails. With colored palette entries loaded the
//! nearest one by RGB distance wins; otherwise a dominant-channel heuristic
//! picks one of four fixed swatches.

use std::sync::Arc;

use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use crate::labels::{ColorLabel, PaletteStore};

/// Confidence reported by the dominant-channel heuristic.
pub const HEURISTIC_CONFIDENCE: f32 = 0.92;

/// Swatch used when no channel strictly dominates (greys, ties).
pub const FALLBACK_LABEL: &str = "pink-300";

/// Result record handed across the boundary as flat JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPrediction {
    /// Label of the matched reference color.
    pub name: String,
    /// Matched reference color as `#RRGGBB`.
    pub hex: String,
    /// The classified input as `(R,G,B)`, 0–255.
    pub rgb: String,
    /// The classified input as `(H,S,V)`: degrees, percent, percent.
    pub hsv: String,
    /// Match confidence in `[0, 1]`.
    pub confidence: f32,
}

impl ColorPrediction {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("failed to serialize prediction: {e}");
            String::from("{}")
        })
    }
}

/// Fixed record used to check host wiring without a palette.
pub fn dummy_prediction() -> ColorPrediction {
    ColorPrediction {
        name: "Red".to_string(),
        hex: "#FF0000".to_string(),
        rgb: "(255,0,0)".to_string(),
        hsv: "(0,100,100)".to_string(),
        confidence: 1.0,
    }
}

/// Convert a normalized channel to 0–255. Out-of-range values clamp, NaN is 0.
pub fn channel_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// `(H,S,V)` with hue in degrees and saturation/value in percent.
pub fn format_hsv([r, g, b]: [u8; 3]) -> String {
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    let h = hsv.hue.into_positive_degrees().round() as u32 % 360;
    let s = (hsv.saturation * 100.0).round() as u32;
    let v = (hsv.value * 100.0).round() as u32;
    format!("({h},{s},{v})")
}

/// Pick a swatch by strictly greatest channel; ties fall back to `pink-300`.
pub fn dominant_channel([r, g, b]: [u8; 3]) -> &'static str {
    if r > g && r > b {
        "red-500"
    } else if g > r && g > b {
        "green-500"
    } else if b > r && b > g {
        "blue-500"
    } else {
        FALLBACK_LABEL
    }
}

/// Classifier reading from an injected [`PaletteStore`].
#[derive(Debug, Clone)]
pub struct ColorClassifier {
    store: Arc<PaletteStore>,
}

impl ColorClassifier {
    pub fn new(store: Arc<PaletteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PaletteStore> {
        &self.store
    }

    /// Classify normalized `[0, 1]` channels.
    pub fn classify(&self, r: f32, g: f32, b: f32) -> ColorPrediction {
        self.classify_rgb8([channel_to_u8(r), channel_to_u8(g), channel_to_u8(b)])
    }

    /// Classify 8-bit channels.
    pub fn classify_rgb8(&self, rgb: [u8; 3]) -> ColorPrediction {
        let palette = self.store.snapshot();
        let (label, confidence) = match nearest(palette.colored(), rgb) {
            Some((label, distance)) => (label.clone(), 1.0 - distance / MAX_DISTANCE),
            None => (ColorLabel::named(dominant_channel(rgb)), HEURISTIC_CONFIDENCE),
        };

        let [r, g, b] = rgb;
        ColorPrediction {
            hex: label.hex(),
            name: label.name,
            rgb: format!("({r},{g},{b})"),
            hsv: format_hsv(rgb),
            confidence,
        }
    }
}

/// Longest possible RGB distance (black to white).
const MAX_DISTANCE: f32 = 441.672_96;

fn nearest<'a>(
    candidates: impl Iterator<Item = (&'a ColorLabel, [u8; 3])>,
    rgb: [u8; 3],
) -> Option<(&'a ColorLabel, f32)> {
    let mut best: Option<(&ColorLabel, f32)> = None;
    for (label, reference) in candidates {
        let d = distance(reference, rgb);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((label, d));
        }
    }
    best
}

fn distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, y)| {
            let d = x as f32 - y as f32;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
