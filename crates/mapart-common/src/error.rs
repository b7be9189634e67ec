use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum MapartError {
    IoError(std::io::Error),
    /// A line of the block configuration could not be used. `line` is 1-based.
    ConfigError { line: usize, message: String },
    BlockStateError(String),
    ImageError(String),
    PaletteError(String),
    TaskError(String),
}

impl MapartError {
    pub fn config(line: usize, message: impl Into<String>) -> Self {
        MapartError::ConfigError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for MapartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapartError::IoError(err) => write!(f, "IO error: {}", err),
            MapartError::ConfigError { line, message } => {
                write!(f, "Config error on line {}: {}", line, message)
            }
            MapartError::BlockStateError(msg) => write!(f, "Invalid block state: {}", msg),
            MapartError::ImageError(msg) => write!(f, "Image error: {}", msg),
            MapartError::PaletteError(msg) => write!(f, "Palette error: {}", msg),
            MapartError::TaskError(msg) => write!(f, "Task error: {}", msg),
        }
    }
}

impl Error for MapartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MapartError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapartError {
    fn from(err: std::io::Error) -> Self {
        MapartError::IoError(err)
    }
}
