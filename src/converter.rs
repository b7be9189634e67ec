use crate::canvas::Canvas;
use crate::config::PaletteConfig;
use crate::palette::{Mode, Palette};
use crate::quantize::{Quantizer, SwatchMatrix};
use crate::terrain::TerrainSection;
use futures::future::try_join_all;
use mapart_common::{MapartError, Result};
use mapart_logger::{log, LogSeverity::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task;

pub const PALETTE_PREVIEW_FILE: &str = "colorPalette.png";
pub const IMAGE_PREVIEW_FILE: &str = "completeImage.png";
pub const BLOCK_COUNTS_FILE: &str = "blockCounts.json";
pub const STRUCTURE_DIR: &str = "structure";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub dithering: bool,
    pub water: bool,
}

impl ConvertOptions {
    /// Staircase mode with dithering and water, writing to `out/` beside the input.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = default_output_dir(&input);
        ConvertOptions {
            input,
            output,
            mode: Mode::default(),
            dithering: true,
            water: true,
        }
    }
}

pub fn default_output_dir(input: &Path) -> PathBuf {
    input.parent().unwrap_or_else(|| Path::new("")).join("out")
}

/// Blocks used by one exported section, before the floor was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: String,
    pub height: i32,
    pub blocks: BTreeMap<String, usize>,
}

/// Converts the image at `options.input` and writes every artifact under `options.output`.
///
/// Colors are reduced in a single pass first; the sections are then independent and get
/// built on the blocking pool.
pub async fn run(options: &ConvertOptions, mut config: PaletteConfig) -> Result<Vec<SectionReport>> {
    config.set_water_enabled(options.water);
    log(format!("Building {} palette", options.mode), Info);
    let palette = Palette::new(options.mode, &config);
    let usable = palette.allowed().count();
    if usable == 0 {
        return Err(MapartError::PaletteError(format!(
            "no usable colors in {} mode; configure at least one block",
            options.mode
        )));
    }
    log(format!("{} usable colors", usable), Debug);

    let structure_dir = options.output.join(STRUCTURE_DIR);
    fs::create_dir_all(&structure_dir).await?;
    palette.save_preview(&options.output.join(PALETTE_PREVIEW_FILE))?;

    log(format!("Loading {}", options.input.display()), Info);
    let canvas = Canvas::open(&options.input)?.padded();
    let (tiles_x, tiles_y) = canvas.tiles();
    log(
        format!(
            "Canvas is {}x{}, {} sections",
            canvas.width(),
            canvas.height(),
            tiles_x * tiles_y
        ),
        Info,
    );

    let dithering = options.dithering;
    let (canvas, matrix) = run_blocking(move || {
        let mut canvas = canvas;
        let matrix = Quantizer::new(&palette, dithering)?.quantize(&mut canvas);
        Ok((canvas, matrix))
    })
    .await?;
    canvas.save_png(&options.output.join(IMAGE_PREVIEW_FILE))?;
    log("Colors reduced".to_owned(), Info);

    let matrix = Arc::new(matrix);
    let config = Arc::new(config);
    let mut jobs = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for i in 0..tiles_x {
        for j in 0..tiles_y {
            let matrix = Arc::clone(&matrix);
            let config = Arc::clone(&config);
            let dir = structure_dir.clone();
            let mode = options.mode;
            jobs.push(run_blocking(move || {
                export_section(&matrix, &config, mode, i, j, &dir)
            }));
        }
    }
    let reports = try_join_all(jobs).await?;

    write_block_counts(&options.output.join(BLOCK_COUNTS_FILE), &reports)?;
    log(
        format!("Done, output in {}", options.output.display()),
        Info,
    );
    Ok(reports)
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(job)
        .await
        .map_err(|e| MapartError::TaskError(e.to_string()))?
}

/// Builds section `(i, j)` and writes `section.i.j.nbt` into `dir`.
pub fn export_section(
    matrix: &SwatchMatrix,
    config: &PaletteConfig,
    mode: Mode,
    i: u32,
    j: u32,
    dir: &Path,
) -> Result<SectionReport> {
    let name = format!("section.{}.{}", i, j);
    let mut section = TerrainSection::assemble(&matrix.tile_columns(i, j), config, mode);

    let blocks = section.count_blocks(config);
    for (state, count) in &blocks {
        log(format!("{}: {} x {}", name, count, state), Debug);
    }

    section.add_floor();
    // a section that fails to write leaves no file behind
    let path = dir.join(format!("{}.nbt", name));
    let partial = dir.join(format!("{}.nbt.tmp", name));
    if let Err(e) = section.save(config, &partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, &path)?;
    log(format!("Saved {}", name), Info);

    Ok(SectionReport {
        section: name,
        height: section.height(),
        blocks,
    })
}

fn write_block_counts(path: &Path, reports: &[SectionReport]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, reports).map_err(io::Error::from)?;
    out.flush()?;
    Ok(())
}
