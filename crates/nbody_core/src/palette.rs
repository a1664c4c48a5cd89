use rand::Rng;

use crate::constants::PALETTE_SIZE;

/// Ordered list of colours; slot 0 is used for the core, the last slot for the rim
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    pub colors: Vec<[f32; 4]>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::fixed()
    }
}

impl ColorPalette {
    /// Warm white core fading through yellow and orange to a blue rim
    pub fn fixed() -> Self {
        Self {
            colors: vec![
                [1.0, 0.97, 0.9, 1.0],
                [1.0, 0.9, 0.65, 1.0],
                [1.0, 0.78, 0.45, 1.0],
                [0.95, 0.6, 0.4, 1.0],
                [0.8, 0.55, 0.6, 1.0],
                [0.6, 0.6, 0.85, 1.0],
                [0.45, 0.6, 1.0, 1.0],
                [0.35, 0.5, 0.95, 1.0],
            ],
        }
    }

    /// A gradient between two random hues
    pub fn random(rng: &mut impl Rng) -> Self {
        let start_hue = rng.gen_range(0.0..360.0f32);
        let sweep = rng.gen_range(60.0..200.0f32) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let colors = (0..PALETTE_SIZE)
            .map(|i| {
                let t = i as f32 / (PALETTE_SIZE - 1) as f32;
                let hue = (start_hue + sweep * t).rem_euclid(360.0);
                let saturation = rng.gen_range(0.45..0.9f32);
                let value = 1.0 - 0.25 * t;
                let [r, g, b] = hsv_to_rgb(hue, saturation, value);
                [r, g, b, 1.0]
            })
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Slot for a normalised radial position in [0, 1]
    pub fn slot_for(&self, t: f32) -> u32 {
        if self.colors.is_empty() {
            return 0;
        }
        let last = self.colors.len() - 1;
        (t.clamp(0.0, 1.0) * last as f32).round() as u32
    }

    /// Colour for a slot; slots beyond the palette wrap around, an empty palette yields white
    pub fn color(&self, slot: u32) -> [f32; 4] {
        if self.colors.is_empty() {
            return [1.0; 4];
        }
        self.colors[slot as usize % self.colors.len()]
    }
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [f32; 3] {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    [r + m, g + m, b + m]
}
