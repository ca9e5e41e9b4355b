// src/render/palette.rs

use crate::config::{ColormapKind, PaletteConfig, PaletteMode};
use crate::error::{AtlasError, AtlasResult};

/// RGB-Farbwert.
pub type Rgb = [u8; 3];

/// Stützstellen der Viridis-Colormap bei t = 0.0, 0.1, ..., 1.0.
const VIRIDIS_STOPS: [Rgb; 11] = [
    [68, 1, 84],
    [72, 36, 117],
    [65, 68, 135],
    [53, 95, 141],
    [42, 120, 142],
    [33, 145, 140],
    [34, 168, 132],
    [68, 191, 112],
    [122, 209, 81],
    [189, 223, 38],
    [253, 231, 37],
];

/// Die 20 Farben der Tab20-Colormap.
const TAB20: [Rgb; 20] = [
    [31, 119, 180],
    [174, 199, 232],
    [255, 127, 14],
    [255, 187, 120],
    [44, 160, 44],
    [152, 223, 138],
    [214, 39, 40],
    [255, 152, 150],
    [148, 103, 189],
    [197, 176, 213],
    [140, 86, 75],
    [196, 156, 148],
    [227, 119, 194],
    [247, 182, 210],
    [127, 127, 127],
    [199, 199, 199],
    [188, 189, 34],
    [219, 219, 141],
    [23, 190, 207],
    [158, 218, 229],
];

/// Anzahl Radfarben beim zyklischen Modus.
const CYCLE_LENGTH: usize = 20;

/// Kontinuierliche Abtastung einer Colormap bei t in [0, 1].
pub fn sample(kind: ColormapKind, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    match kind {
        ColormapKind::Viridis => {
            let scaled = t * (VIRIDIS_STOPS.len() - 1) as f64;
            let lower = scaled.floor() as usize;
            let upper = scaled.ceil() as usize;
            if lower == upper {
                return VIRIDIS_STOPS[lower];
            }
            let frac = scaled - lower as f64;
            let a = VIRIDIS_STOPS[lower];
            let b = VIRIDIS_STOPS[upper];
            [
                lerp_channel(a[0], b[0], frac),
                lerp_channel(a[1], b[1], frac),
                lerp_channel(a[2], b[2], frac),
            ]
        }
        ColormapKind::Tab20 => {
            let index = (t * (TAB20.len() - 1) as f64).round() as usize;
            TAB20[index.min(TAB20.len() - 1)]
        }
    }
}

/// Diskrete Radfarbe für den zyklischen Modus.
pub fn cycle(kind: ColormapKind, index: usize) -> Rgb {
    match kind {
        ColormapKind::Tab20 => TAB20[index % TAB20.len()],
        ColormapKind::Viridis => {
            let slot = index % CYCLE_LENGTH;
            sample(kind, slot as f64 / (CYCLE_LENGTH - 1) as f64)
        }
    }
}

/// Weist jedem Territorium eine Farbe zu. Im manuellen Modus muss die
/// Klassenliste genauso lang sein wie die Territorienliste.
pub fn territory_colors(config: &PaletteConfig, count: usize) -> AtlasResult<Vec<Rgb>> {
    match &config.mode {
        PaletteMode::Cycle => Ok((0..count).map(|index| cycle(config.colormap, index)).collect()),
        PaletteMode::Manual { classes, levels } => {
            if classes.len() != count {
                return Err(AtlasError::InvalidConfiguration {
                    message: format!(
                        "Manual palette has {} classes for {} territories.",
                        classes.len(),
                        count
                    ),
                });
            }
            let span = (*levels).max(2) - 1;
            Ok(classes
                .iter()
                .map(|class| sample(config.colormap, *class as f64 / span as f64))
                .collect())
        }
    }
}

/// Liest eine `#rrggbb`-Farbangabe.
pub fn parse_hex(value: &str) -> AtlasResult<Rgb> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AtlasError::InvalidConfiguration {
            message: format!("`{value}` is not a #rrggbb color"),
        });
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).unwrap_or_default()
    };
    Ok([channel(0..2), channel(2..4), channel(4..6)])
}

/// Hex-Schreibweise einer Farbe (für SVG-Stile).
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}
