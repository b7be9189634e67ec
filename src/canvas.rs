use image::{Rgb as Pixel, RgbImage, RgbaImage};
use mapart_common::{MapartError, Result, Rgb};
use std::path::Path;

/// Edge length of one map, and of one exported section.
pub const TILE_SIZE: u32 = 128;

/// Owned RGB pixel buffer in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Transparent pixels are composited onto black.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                let over_black = |c: u8| (c as u32 * a as u32 / 255) as u8;
                Rgb::new(over_black(r), over_black(g), over_black(b))
            })
            .collect();
        Canvas {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .map_err(|e| MapartError::ImageError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_rgba(&decoded.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.pixels[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
    }

    /// Copy grown with black to the next multiple of [`TILE_SIZE`] on both axes.
    pub fn padded(&self) -> Canvas {
        let round_up = |v: u32| v.div_ceil(TILE_SIZE) * TILE_SIZE;
        let (width, height) = (round_up(self.width), round_up(self.height));
        let mut padded = Canvas::filled(width, height, Rgb::BLACK);
        for y in 0..self.height {
            let src = self.offset(0, y);
            let dst = padded.offset(0, y);
            padded.pixels[dst..dst + self.width as usize]
                .copy_from_slice(&self.pixels[src..src + self.width as usize]);
        }
        padded
    }

    /// Number of whole tiles along x and y.
    pub fn tiles(&self) -> (u32, u32) {
        (self.width / TILE_SIZE, self.height / TILE_SIZE)
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| Pixel(self.get(x, y).channels()))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image()
            .save(path)
            .map_err(|e| MapartError::ImageError(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_padding_keeps_content_at_origin() {
        let mut canvas = Canvas::filled(130, 5, Rgb::new(9, 9, 9));
        canvas.set(129, 4, Rgb::new(1, 2, 3));
        let padded = canvas.padded();

        assert_eq!((padded.width(), padded.height()), (256, 128));
        assert_eq!(padded.tiles(), (2, 1));
        assert_eq!(padded.get(0, 0), Rgb::new(9, 9, 9));
        assert_eq!(padded.get(129, 4), Rgb::new(1, 2, 3));
        assert_eq!(padded.get(130, 4), Rgb::BLACK);
        assert_eq!(padded.get(0, 5), Rgb::BLACK);
    }

    #[test]
    fn test_exact_multiple_is_unchanged() {
        let canvas = Canvas::filled(128, 256, Rgb::new(4, 5, 6));
        assert_eq!(canvas.padded(), canvas);
    }

    #[test]
    fn test_alpha_composites_onto_black() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([200, 100, 50, 255]));
        image.put_pixel(1, 0, Rgba([200, 100, 50, 0]));
        let canvas = Canvas::from_rgba(&image);
        assert_eq!(canvas.get(0, 0), Rgb::new(200, 100, 50));
        assert_eq!(canvas.get(1, 0), Rgb::BLACK);
    }

    #[test]
    fn test_image_conversion() {
        let mut canvas = Canvas::filled(3, 2, Rgb::BLACK);
        canvas.set(2, 1, Rgb::new(10, 20, 30));
        let image = canvas.to_image();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30]);
    }
}
