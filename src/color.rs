use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Line colour
// ---------------------------------------------------------------------------

/// A line colour: 8-bit RGB plus an opacity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub opacity: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, opacity: 1.0 }
    }

    /// Same hue at a different opacity.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Rgba {
            opacity: opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl From<Rgba> for Color32 {
    fn from(c: Rgba) -> Self {
        Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.opacity * 255.0).round() as u8)
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgba> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.5);
            let rgb: Srgb = hsl.into_color();
            Rgba::rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Colour by index
// ---------------------------------------------------------------------------

/// Opacity of individual run lines.
pub const RUN_OPACITY: f32 = 0.8;
/// Opacity of min/max band lines.
pub const BAND_OPACITY: f32 = 0.3;
/// Opacity of unsmoothed lines drawn behind their smoothed version.
pub const FADED_OPACITY: f32 = 0.1;

/// Deterministic colour assignment by sequential index.
pub trait ColorProvider {
    /// Colour for `index` at the given opacity. Must return the same colour
    /// for the same arguments on every call.
    fn color(&self, index: usize, opacity: f32) -> Rgba;
}

/// Cycles through a fixed set of hues, so a line's colour depends only on
/// its index and not on how many lines are drawn.
#[derive(Debug, Clone)]
pub struct IndexPalette {
    colors: Vec<Rgba>,
}

impl IndexPalette {
    pub const SIZE: usize = 10;

    pub fn new() -> Self {
        let base = generate_palette(Self::SIZE);
        // Interleave so neighbouring indices land on distant hues.
        let colors = (0..Self::SIZE)
            .map(|i| base[(i * 3) % Self::SIZE])
            .collect();
        IndexPalette { colors }
    }
}

impl Default for IndexPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorProvider for IndexPalette {
    fn color(&self, index: usize, opacity: f32) -> Rgba {
        self.colors[index % self.colors.len()].with_opacity(opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_stable_and_cycles() {
        let p = IndexPalette::new();
        assert_eq!(p.color(3, 1.0), p.color(3, 1.0));
        assert_eq!(p.color(0, 1.0), p.color(IndexPalette::SIZE, 1.0));
        assert_ne!(p.color(0, 1.0), p.color(1, 1.0));
    }

    #[test]
    fn opacity_changes_alpha_only() {
        let p = IndexPalette::new();
        let full = p.color(2, 1.0);
        let band = p.color(2, BAND_OPACITY);
        assert_eq!((full.r, full.g, full.b), (band.r, band.g, band.b));
        assert_eq!(band.opacity, BAND_OPACITY);
    }

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(IndexPalette::SIZE);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
