use clap::{ArgAction, Parser, ValueHint};
use mapart::{ConvertOptions, Mode, PaletteConfig};
use mapart_logger::{log, LogSeverity::*};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "mapart", version, about = "Turns an image into shaded map art structures")]
struct Cli {
    /// Image to convert
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    /// Output folder, defaults to `out/` next to the image
    #[arg(value_hint = ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// staircase, flat, grounded, ascending or descending
    #[arg(long = "mode", default_value_t = Mode::Staircase)]
    mode: Mode,
    /// Skip error diffusion
    #[arg(long = "nodither", action = ArgAction::SetTrue)]
    no_dither: bool,
    /// Never use water
    #[arg(long = "nowater", action = ArgAction::SetTrue)]
    no_water: bool,
    /// Block configuration file
    #[arg(long = "config", default_value = "config.txt", value_hint = ValueHint::FilePath)]
    config: PathBuf,
}

impl Cli {
    fn options(&self) -> ConvertOptions {
        let mut options = ConvertOptions::new(&self.input);
        if let Some(output) = &self.output {
            options.output = output.clone();
        }
        options.mode = self.mode;
        options.dithering = !self.no_dither;
        options.water = !self.no_water;
        options
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    log("Mapart init".to_string(), Info);

    let result = match PaletteConfig::load(&cli.config) {
        Ok(config) => mapart::run(&cli.options(), config).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log(format!("{}", e), Fatal);
            ExitCode::FAILURE
        }
    }
}
