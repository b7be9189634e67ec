pub mod canvas;
pub mod config;
pub mod converter;
pub mod palette;
pub mod quantize;
pub mod terrain;

// Re-export commonly used items
pub use config::PaletteConfig;
pub use converter::{run, ConvertOptions, SectionReport};
pub use mapart_common::{MapartError, Result};
pub use palette::{Mode, Palette, SwatchId, Variation};
