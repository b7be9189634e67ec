use crate::config::{PaletteConfig, COLOR_COUNT, WATER_COLOR_ID};
use image::{Rgb as Pixel, RgbImage};
use mapart_common::{MapartError, Result, Rgb};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Map base colors, indexed by color id.
pub const BASE_COLORS: [u32; COLOR_COUNT] = [
    0x7FB238, 0xF7E9A3, 0xC7C7C7, 0xFF0000, 0xA0A0FF, 0xA7A7A7, 0x007C00, 0xFFFFFF, 0xA4A8B8,
    0x976D4D, 0x707070, 0x4040FF, 0x8F7748, 0xFFFCF5, 0xD87F33, 0xB24CD8, 0x6699D8, 0xE5E533,
    0x7FCC19, 0xF27FA5, 0x4C4C4C, 0x999999, 0x4C7F99, 0x7F3FB2, 0x334CB2, 0x664C33, 0x667F33,
    0x993333, 0x191919, 0xFAEE4D, 0x5CDBD5, 0x4A80FF, 0x00D93A, 0x815631, 0x700200, 0xD1B1A1,
    0x9F5224, 0x95576C, 0x706C8A, 0xBA8524, 0x677535, 0xA04D4E, 0x392923, 0x876B62, 0x575C5C,
    0x7A4958, 0x4C3E5C, 0x4C3223, 0x4C522A, 0x8E3C2E, 0x251610, 0xBD3031, 0x943F61, 0x5C191D,
    0x167E86, 0x3A8E8C, 0x562C3E, 0x14B485,
];

/// Shade of a map color. On the map, a block is drawn darker when the block north of it
/// is higher, lighter when it is lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variation {
    Darker,
    Normal,
    Lighter,
}

impl Variation {
    pub const ALL: [Variation; 3] = [Variation::Darker, Variation::Normal, Variation::Lighter];

    /// Channel multiplier, out of 255.
    pub fn scale(self) -> u32 {
        match self {
            Variation::Darker => 180,
            Variation::Normal => 220,
            Variation::Lighter => 255,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Height change from this block to the next one north of it.
    pub fn height_step(self) -> i32 {
        match self {
            Variation::Darker => 1,
            Variation::Normal => 0,
            Variation::Lighter => -1,
        }
    }

    /// Water shade depends on depth instead of height.
    pub fn water_depth(self) -> i32 {
        match self {
            Variation::Lighter => 1,
            Variation::Normal => 5,
            Variation::Darker => 10,
        }
    }
}

/// One palette entry, i.e. what a single pixel gets mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwatchId {
    pub color_id: u8,
    pub variation: Variation,
}

impl SwatchId {
    pub const fn new(color_id: u8, variation: Variation) -> Self {
        SwatchId {
            color_id,
            variation,
        }
    }

    pub fn index(self) -> usize {
        self.color_id as usize * 3 + self.variation.index()
    }

    pub fn is_water(self) -> bool {
        self.color_id == WATER_COLOR_ID
    }
}

/// CIELAB (D50) scaled into byte range: `l` in `[0, 255]`, `a` and `b` offset by 128.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lab {
    pub l: i32,
    pub a: i32,
    pub b: i32,
}

impl Lab {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let [r, g, b] = rgb.channels().map(|c| srgb_to_linear(c as f64 / 255.0));

        let x = 0.4360747 * r + 0.3850649 * g + 0.1430804 * b;
        let y = 0.2225045 * r + 0.7168786 * g + 0.0606169 * b;
        let z = 0.0139322 * r + 0.0971045 * g + 0.7141733 * b;

        let fx = lab_f(x / 0.96422);
        let fy = lab_f(y / 1.0);
        let fz = lab_f(z / 0.82521);

        Lab {
            l: (2.55 * (116.0 * fy - 16.0)) as i32,
            a: 128 + (500.0 * (fx - fy)) as i32,
            b: 128 + (200.0 * (fy - fz)) as i32,
        }
    }

    pub fn distance_sq(self, other: Lab) -> i32 {
        let (dl, da, db) = (self.l - other.l, self.a - other.a, self.b - other.b);
        dl * dl + da * da + db * db
    }
}

fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 216.0 / 24389.0 {
        t.powf(1.0 / 3.0)
    } else {
        ((24389.0 / 27.0) * t + 16.0) / 116.0
    }
}

/// Terrain layout strategy. Limits which shades are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Full shade range, heights drift freely.
    #[default]
    Staircase,
    /// Normal shade only; one layer high.
    Flat,
    /// Full shade range, staircases flattened onto the ground.
    Grounded,
    /// Darker and normal only, so terrain only rises northwards.
    Ascending,
    /// Lighter and normal only, so terrain only falls northwards.
    Descending,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Staircase,
        Mode::Flat,
        Mode::Grounded,
        Mode::Ascending,
        Mode::Descending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Staircase => "staircase",
            Mode::Flat => "flat",
            Mode::Grounded => "grounded",
            Mode::Ascending => "ascending",
            Mode::Descending => "descending",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Mode::ALL.iter().map(|m| m.name()).collect();
                format!("unknown mode {:?}, expected one of {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub id: SwatchId,
    pub rgb: Rgb,
    pub lab: Lab,
    pub allowed: bool,
}

/// Every `(color, shade)` pair in id order, all allowed.
pub fn build_swatches(base_colors: &[u32; COLOR_COUNT]) -> Vec<Swatch> {
    let mut swatches = Vec::with_capacity(COLOR_COUNT * 3);
    for (color_id, &base) in base_colors.iter().enumerate() {
        let base = Rgb::from_packed(base);
        for variation in Variation::ALL {
            let scale = variation.scale();
            let rgb = Rgb::from_channels(base.channels().map(|c| (c as u32 * scale / 255) as u8));
            swatches.push(Swatch {
                id: SwatchId::new(color_id as u8, variation),
                rgb,
                lab: Lab::from_rgb(rgb),
                allowed: true,
            });
        }
    }
    swatches
}

/// Usable swatches for `mode`, indexed by [`SwatchId::index`].
pub fn compute_allow_mask(mode: Mode, config: &PaletteConfig) -> Vec<bool> {
    let mut allowed = vec![true; COLOR_COUNT * 3];
    let mut set = |color_id: u8, variation: Variation, value: bool| {
        allowed[SwatchId::new(color_id, variation).index()] = value;
    };

    for color_id in 0..COLOR_COUNT as u8 {
        if config.color_block(color_id).is_none() {
            for variation in Variation::ALL {
                set(color_id, variation, false);
            }
        }
    }

    match mode {
        Mode::Flat => {
            for color_id in 0..COLOR_COUNT as u8 {
                set(color_id, Variation::Darker, false);
                set(color_id, Variation::Lighter, false);
            }
            // shallow water marks flat water
            set(WATER_COLOR_ID, Variation::Normal, false);
            set(WATER_COLOR_ID, Variation::Lighter, true);
        }
        Mode::Ascending => {
            for color_id in 0..COLOR_COUNT as u8 {
                set(color_id, Variation::Lighter, false);
            }
            set(WATER_COLOR_ID, Variation::Lighter, true);
        }
        Mode::Descending => {
            for color_id in 0..COLOR_COUNT as u8 {
                set(color_id, Variation::Darker, false);
            }
            set(WATER_COLOR_ID, Variation::Darker, true);
        }
        Mode::Staircase | Mode::Grounded => {}
    }

    if !config.water_enabled() {
        for variation in Variation::ALL {
            set(WATER_COLOR_ID, variation, false);
        }
    }
    allowed
}

/// Swatches with their allow flags for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Palette {
    swatches: Vec<Swatch>,
}

impl Palette {
    pub fn new(mode: Mode, config: &PaletteConfig) -> Self {
        let mut swatches = build_swatches(&BASE_COLORS);
        let mask = compute_allow_mask(mode, config);
        for swatch in &mut swatches {
            swatch.allowed = mask[swatch.id.index()];
        }
        Palette { swatches }
    }

    pub fn swatch(&self, id: SwatchId) -> &Swatch {
        &self.swatches[id.index()]
    }

    /// Allowed swatches in id order.
    pub fn allowed(&self) -> impl Iterator<Item = &Swatch> + '_ {
        self.swatches.iter().filter(|s| s.allowed)
    }

    /// One 4 pixel high, 128 pixel wide stripe per allowed swatch.
    pub fn preview(&self) -> RgbImage {
        const STRIPE_HEIGHT: u32 = 4;
        const WIDTH: u32 = 128;

        let stripes: Vec<Rgb> = self.allowed().map(|s| s.rgb).collect();
        RgbImage::from_fn(WIDTH, stripes.len() as u32 * STRIPE_HEIGHT, |_, y| {
            Pixel(stripes[(y / STRIPE_HEIGHT) as usize].channels())
        })
    }

    pub fn save_preview(&self, path: &Path) -> Result<()> {
        self.preview()
            .save(path)
            .map_err(|e| MapartError::ImageError(format!("{}: {}", path.display(), e)))
    }
}
