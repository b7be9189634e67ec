use crate::canvas::{Canvas, TILE_SIZE};
use crate::palette::{Lab, Palette, Swatch, SwatchId};
use mapart_common::{MapartError, Result, Rgb};
use mapart_logger::{log, LogSeverity::Debug};
use std::collections::HashMap;

/// `(dx, dy, weight / 16)` for each pixel receiving error.
pub const DIFFUSION: [(i32, i32, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];
const DIFFUSION_DIVISOR: f64 = 16.0;

/// Swatch chosen for every pixel of a canvas, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwatchMatrix {
    width: u32,
    ids: Vec<SwatchId>,
}

impl SwatchMatrix {
    pub fn get(&self, x: u32, y: u32) -> SwatchId {
        self.ids[y as usize * self.width as usize + x as usize]
    }

    /// The 128 image columns of tile `(i, j)`, each listed north to south.
    pub fn tile_columns(&self, i: u32, j: u32) -> Vec<Vec<SwatchId>> {
        (0..TILE_SIZE)
            .map(|dx| {
                (0..TILE_SIZE)
                    .map(|dz| self.get(i * TILE_SIZE + dx, j * TILE_SIZE + dz))
                    .collect()
            })
            .collect()
    }
}

/// One nearest-swatch pass over a canvas, with optional Floyd-Steinberg error diffusion.
/// Remembers every color it has matched.
#[derive(Debug)]
pub struct Quantizer<'a> {
    palette: &'a Palette,
    candidates: Vec<Swatch>,
    cache: HashMap<u32, SwatchId>,
    dithering: bool,
}

impl<'a> Quantizer<'a> {
    pub fn new(palette: &'a Palette, dithering: bool) -> Result<Self> {
        let candidates: Vec<Swatch> = palette.allowed().copied().collect();
        if candidates.is_empty() {
            return Err(MapartError::PaletteError(
                "no usable colors; configure at least one block".to_owned(),
            ));
        }
        Ok(Quantizer {
            palette,
            candidates,
            cache: HashMap::new(),
            dithering,
        })
    }

    /// Closest allowed swatch by Lab distance. Ties go to the lowest id.
    pub fn nearest_swatch(&mut self, rgb: Rgb) -> SwatchId {
        let candidates = &self.candidates;
        *self.cache.entry(rgb.packed()).or_insert_with(|| {
            let lab = Lab::from_rgb(rgb);
            let mut best = candidates[0].id;
            let mut best_distance = i32::MAX;
            for swatch in candidates {
                let distance = lab.distance_sq(swatch.lab);
                if distance < best_distance {
                    best = swatch.id;
                    best_distance = distance;
                }
            }
            best
        })
    }

    /// Replaces every pixel by its swatch color and returns the chosen swatches.
    ///
    /// Pixels are visited row by row; with dithering on, each pixel's error lands only
    /// on pixels that are still ahead in that order.
    pub fn quantize(&mut self, canvas: &mut Canvas) -> SwatchMatrix {
        let (width, height) = (canvas.width(), canvas.height());
        let total = width as u64 * height as u64;
        let mut ids = Vec::with_capacity(total as usize);
        let mut done = 0u64;
        let mut last_percent = 0;

        for y in 0..height {
            for x in 0..width {
                let original = canvas.get(x, y);
                let id = self.nearest_swatch(original);
                let matched = self.palette.swatch(id).rgb;
                canvas.set(x, y, matched);
                ids.push(id);

                if self.dithering {
                    diffuse_error(canvas, x, y, original, matched);
                }

                done += 1;
                let percent = done * 100 / total;
                if percent % 5 == 0 && percent != last_percent {
                    log(format!("Reducing colors: {}%", percent), Debug);
                    last_percent = percent;
                }
            }
        }

        SwatchMatrix { width, ids }
    }
}

fn diffuse_error(canvas: &mut Canvas, x: u32, y: u32, original: Rgb, matched: Rgb) {
    let error: [f64; 3] = [
        original.r as f64 - matched.r as f64,
        original.g as f64 - matched.g as f64,
        original.b as f64 - matched.b as f64,
    ];

    for (dx, dy, weight) in DIFFUSION {
        let (nx, ny) = (x as i64 + dx as i64, y as i64 + dy as i64);
        if nx < 0 || ny < 0 || nx >= canvas.width() as i64 || ny >= canvas.height() as i64 {
            continue;
        }
        let (nx, ny) = (nx as u32, ny as u32);
        let mut channels = canvas.get(nx, ny).channels();
        for (channel, err) in channels.iter_mut().zip(error) {
            let value = *channel as f64 + err * weight as f64 / DIFFUSION_DIVISOR;
            *channel = value.clamp(0.0, 255.0) as u8;
        }
        canvas.set(nx, ny, Rgb::from_channels(channels));
    }
}
