//! Reference palette: label parsing, Material color pairing and the
//! injectable [`PaletteStore`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// One named color. `rgb` is `None` for labels with no known color value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorLabel {
    pub name: String,
    pub rgb: Option<[u8; 3]>,
}

impl ColorLabel {
    /// Label paired with its Material color, if one is known.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let rgb = material_rgb(&name);
        Self { name, rgb }
    }

    /// `#RRGGBB`, or `#000000` for labels without a color.
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb.unwrap_or([0, 0, 0]);
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Material Design swatches known by exact name.
const MATERIAL: &[(&str, [u8; 3])] = &[
    ("red-500", [0xF4, 0x43, 0x36]),
    ("pink-300", [0xF0, 0x62, 0x92]),
    ("pink-500", [0xE9, 0x1E, 0x63]),
    ("purple-500", [0x9C, 0x27, 0xB0]),
    ("deep-purple-500", [0x67, 0x3A, 0xB7]),
    ("indigo-500", [0x3F, 0x51, 0xB5]),
    ("blue-500", [0x21, 0x96, 0xF3]),
    ("light-blue-500", [0x03, 0xA9, 0xF4]),
    ("cyan-500", [0x00, 0xBC, 0xD4]),
    ("teal-500", [0x00, 0x96, 0x88]),
    ("green-500", [0x4C, 0xAF, 0x50]),
    ("light-green-500", [0x8B, 0xC3, 0x4A]),
    ("lime-500", [0xCD, 0xDC, 0x39]),
    ("yellow-500", [0xFF, 0xEB, 0x3B]),
    ("amber-500", [0xFF, 0xC1, 0x07]),
    ("orange-500", [0xFF, 0x98, 0x00]),
    ("deep-orange-500", [0xFF, 0x57, 0x22]),
    ("brown-500", [0x79, 0x55, 0x48]),
    ("grey-500", [0x9E, 0x9E, 0x9E]),
    ("blue-grey-500", [0x60, 0x7D, 0x8B]),
];

/// Family prefixes, for shades not listed above. Longer prefixes first so
/// `deep-orange-` wins over `orange-`.
const MATERIAL_FAMILIES: &[(&str, [u8; 3])] = &[
    ("deep-purple-", [0x67, 0x3A, 0xB7]),
    ("deep-orange-", [0xFF, 0x57, 0x22]),
    ("light-green-", [0x8B, 0xC3, 0x4A]),
    ("light-blue-", [0x03, 0xA9, 0xF4]),
    ("blue-grey-", [0x60, 0x7D, 0x8B]),
    ("red-", [0xF4, 0x43, 0x36]),
    ("pink-", [0xE9, 0x1E, 0x63]),
    ("blue-", [0x21, 0x96, 0xF3]),
    ("green-", [0x4C, 0xAF, 0x50]),
    ("yellow-", [0xFF, 0xEB, 0x3B]),
    ("orange-", [0xFF, 0x98, 0x00]),
    ("purple-", [0x9C, 0x27, 0xB0]),
    ("brown-", [0x79, 0x55, 0x48]),
    ("grey-", [0x9E, 0x9E, 0x9E]),
];

/// Look up a Material color by exact swatch name, then by family prefix.
pub fn material_rgb(name: &str) -> Option<[u8; 3]> {
    let name = name.to_ascii_lowercase();
    MATERIAL
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| MATERIAL_FAMILIES.iter().find(|(p, _)| name.starts_with(p)))
        .map(|(_, rgb)| *rgb)
}

/// Parse a line-oriented list of quoted, comma-terminated labels.
///
/// Intentionally permissive; this is not a strict format. For each line,
/// all whitespace is removed, then one leading `"` and any trailing `,`
/// and `"` characters are stripped. Lines that end up empty are skipped.
/// Nothing in the input is ever an error. JSON brackets on their own line
/// are skipped as well.
pub fn load_labels(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .filter_map(|line| {
            let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            let s = compact.strip_prefix('"').unwrap_or(&compact);
            let s = s.trim_end_matches([',', '"']);
            if s.is_empty() || matches!(s, "[" | "]" | "{" | "}") {
                None
            } else {
                Some(s.to_string())
            }
        })
        .collect()
}

/// Parse a JSON label asset: either an array of strings or a
/// `{"0": "red-500", "1": ...}` object keyed by index. Non-integer keys are
/// ignored, gaps are filled with `color-<i>`, and non-string values are kept
/// as their JSON text (`12`, `true`, `null`). Returns `None` when the
/// bytes are neither.
fn load_json_labels(bytes: &[u8]) -> Option<Vec<String>> {
    if let Ok(list) = serde_json::from_slice::<Vec<String>>(bytes) {
        return Some(list);
    }
    let map: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes).ok()?;
    let indexed: BTreeMap<usize, String> = map
        .into_iter()
        .filter_map(|(k, v)| {
            let idx = k.parse::<usize>().ok()?;
            let name = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((idx, name))
        })
        .collect();
    let Some(&max) = indexed.keys().next_back() else {
        return Some(Vec::new());
    };
    Some(
        (0..=max)
            .map(|i| indexed.get(&i).cloned().unwrap_or_else(|| format!("color-{i}")))
            .collect(),
    )
}

/// An immutable set of reference colors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePalette {
    labels: Vec<ColorLabel>,
}

impl ReferencePalette {
    pub fn new(labels: Vec<ColorLabel>) -> Self {
        Self { labels }
    }

    /// Parse a label asset: JSON when it is a string array or an
    /// index-keyed object, otherwise the lenient line format of
    /// [`load_labels`]. Empty names are dropped.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut names = load_json_labels(bytes).unwrap_or_else(|| load_labels(bytes));
        names.retain(|n| !n.trim().is_empty());
        Self::new(names.into_iter().map(ColorLabel::named).collect())
    }

    /// Every Material 500 swatch plus `pink-300`.
    pub fn material() -> Self {
        Self::new(
            MATERIAL
                .iter()
                .map(|(name, rgb)| ColorLabel {
                    name: (*name).to_string(),
                    rgb: Some(*rgb),
                })
                .collect(),
        )
    }

    pub fn labels(&self) -> &[ColorLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels that carry a color value.
    pub fn colored(&self) -> impl Iterator<Item = (&ColorLabel, [u8; 3])> {
        self.labels.iter().filter_map(|l| l.rgb.map(|rgb| (l, rgb)))
    }
}

/// Owns the current reference palette. Lookups clone an `Arc` snapshot
/// under a read lock; loads swap in a fully built palette.
#[derive(Debug, Default)]
pub struct PaletteStore {
    current: RwLock<Arc<ReferencePalette>>,
}

impl PaletteStore {
    pub fn new(palette: ReferencePalette) -> Self {
        Self {
            current: RwLock::new(Arc::new(palette)),
        }
    }

    /// Parse `bytes` and replace the current palette. Returns the label count.
    pub fn load(&self, bytes: &[u8]) -> usize {
        let palette = ReferencePalette::parse(bytes);
        let count = palette.len();
        self.replace(palette);
        tracing::info!("loaded {count} labels");
        count
    }

    /// Replace the current palette.
    pub fn replace(&self, palette: ReferencePalette) {
        *self.current.write() = Arc::new(palette);
    }

    /// Snapshot of the current palette.
    pub fn snapshot(&self) -> Arc<ReferencePalette> {
        Arc::clone(&self.current.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_labels_quoted_comma_terminated() {
        let labels = load_labels(b"\"Red\",\n\"Green\",\n\"Blue\"\n");
        assert_eq!(labels, vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn test_load_labels_skips_blank_and_junk_lines() {
        let labels = load_labels(b"[\n  \"Red\" ,\n\n   \n\",\n\"\"\n\"Dark Blue\",\r\n]\n");
        assert_eq!(labels, vec!["Red", "DarkBlue"]);
    }

    #[test]
    fn test_load_labels_tolerates_invalid_utf8() {
        let labels = load_labels(b"\"Red\",\n\xFF\xFE\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "Red");
    }

    #[test]
    fn test_indexed_json_fills_gaps() {
        let palette = ReferencePalette::parse(br#"{"0": "red-500", "2": "blue-700", "meta": "x"}"#);
        let names: Vec<_> = palette.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["red-500", "color-1", "blue-700"]);
        assert_eq!(palette.labels()[2].hex(), "#2196F3");
        assert_eq!(palette.labels()[1].rgb, None);
    }

    #[test]
    fn test_indexed_json_stringifies_non_string_values() {
        let names = load_json_labels(br#"{"0": 12, "1": true, "2": null, "4": "teal-500"}"#).unwrap();
        assert_eq!(names, vec!["12", "true", "null", "color-3", "teal-500"]);
    }

    #[test]
    fn test_json_array_and_line_list_agree() {
        let from_json = ReferencePalette::parse(br#"["Red", "Green", "Blue"]"#);
        let from_lines = ReferencePalette::parse(b"\"Red\",\n\"Green\",\n\"Blue\",\n");
        assert_eq!(from_json, from_lines);
        assert_eq!(from_json.len(), 3);
    }

    #[test]
    fn test_material_lookup_prefers_longest_family() {
        assert_eq!(material_rgb("deep-orange-200"), Some([0xFF, 0x57, 0x22]));
        assert_eq!(material_rgb("orange-200"), Some([0xFF, 0x98, 0x00]));
        assert_eq!(material_rgb("Pink-300"), Some([0xF0, 0x62, 0x92]));
        assert_eq!(material_rgb("mauve"), None);
        assert_eq!(ColorLabel::named("mauve").hex(), "#000000");
    }

    #[test]
    fn test_store_reload_replaces_snapshot() {
        let store = PaletteStore::default();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.load(b"\"red-500\",\n\"green-500\",\n"), 2);
        let first = store.snapshot();
        store.load(b"\"blue-500\"\n");
        assert_eq!(first.len(), 2, "old snapshots stay valid");
        assert_eq!(store.snapshot().len(), 1);
    }
}
