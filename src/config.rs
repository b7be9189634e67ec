use mapart_common::{MapartError, Result};
use mapart_logger::{log, LogSeverity::Warning};
use mapart_structure::BlockState;
use std::fs;
use std::path::Path;

/// Number of map base colors.
pub const COLOR_COUNT: usize = 58;
/// Zero-based id of the water color. The config file calls it 12.
pub const WATER_COLOR_ID: u8 = 11;
pub const WATER_BLOCK_STATE: &str = "minecraft:water[level=0]";
/// Transparent block used to hold water in place and as the floor.
pub const GLASS_BLOCK_STATE: &str = "minecraft:glass";

/// What gets placed for one map color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBlock<'a> {
    Terrain {
        block_state: &'a str,
        needs_support: bool,
    },
    Fluid,
}

/// Which block represents each base color, plus the support block.
#[derive(Debug, Clone)]
pub struct PaletteConfig {
    block_states: Vec<Option<String>>,
    needs_support: [bool; COLOR_COUNT],
    support_block: String,
    water_enabled: bool,
}

impl PaletteConfig {
    /// Config with only water mapped and water enabled.
    pub fn new(support_block: impl Into<String>) -> Self {
        PaletteConfig {
            block_states: vec![None; COLOR_COUNT],
            needs_support: [false; COLOR_COUNT],
            support_block: support_block.into(),
            water_enabled: true,
        }
    }

    /// Maps `color_id` (zero-based) to a block state. Returns false for the water color,
    /// which always uses [`WATER_BLOCK_STATE`].
    pub fn set_block(&mut self, color_id: u8, block_state: impl Into<String>) -> bool {
        if color_id == WATER_COLOR_ID {
            return false;
        }
        if let Some(slot) = self.block_states.get_mut(color_id as usize) {
            *slot = Some(block_state.into());
        }
        true
    }

    pub fn set_needs_support(&mut self, color_id: u8, needs_support: bool) {
        if let Some(flag) = self.needs_support.get_mut(color_id as usize) {
            *flag = needs_support;
        }
    }

    pub fn set_water_enabled(&mut self, enabled: bool) {
        self.water_enabled = enabled;
    }

    pub fn water_enabled(&self) -> bool {
        self.water_enabled
    }

    pub fn support_block(&self) -> &str {
        &self.support_block
    }

    pub fn color_block(&self, color_id: u8) -> Option<ColorBlock<'_>> {
        if color_id == WATER_COLOR_ID {
            return Some(ColorBlock::Fluid);
        }
        let block_state = self.block_states.get(color_id as usize)?.as_deref()?;
        Some(ColorBlock::Terrain {
            block_state,
            needs_support: self.needs_support[color_id as usize],
        })
    }

    pub fn block_state(&self, color_id: u8) -> Option<&str> {
        match self.color_block(color_id)? {
            ColorBlock::Fluid => Some(WATER_BLOCK_STATE),
            ColorBlock::Terrain { block_state, .. } => Some(block_state),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses the line based config format:
    ///
    /// ```text
    /// support: minecraft:cobblestone
    /// needSupport: 3, 7
    /// 01: minecraft:grass_block[snowy=false]
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = PaletteConfig::new(String::new());
        let mut support_block = None;
        let mut line_count = 0;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            line_count = line_no;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix("support:") {
                support_block = Some(checked_state(rest, line_no)?);
            } else if let Some(rest) = line.strip_prefix("needSupport:") {
                for id in rest.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                    let color_id = parse_color_index(id, line_no)?;
                    config.set_needs_support(color_id, true);
                }
            } else {
                let (id, state) = line.split_once(':').ok_or_else(|| {
                    MapartError::config(line_no, "expected `<color index>: <block state>`")
                })?;
                let color_id = parse_color_index(id.trim(), line_no)?;
                let state = checked_state(state, line_no)?;
                if !config.set_block(color_id, state) {
                    log(
                        format!(
                            "Line {}: the water block can't be changed, ignoring",
                            line_no
                        ),
                        Warning,
                    );
                }
            }
        }

        config.support_block = support_block
            .ok_or_else(|| MapartError::config(line_count + 1, "no `support:` line found"))?;
        Ok(config)
    }
}

fn checked_state(state: &str, line_no: usize) -> Result<String> {
    let state = state.trim();
    BlockState::parse(state).map_err(|e| MapartError::config(line_no, e.to_string()))?;
    Ok(state.to_owned())
}

/// Converts a 1-based config index to a zero-based color id.
fn parse_color_index(id: &str, line_no: usize) -> Result<u8> {
    let index: usize = id
        .parse()
        .map_err(|_| MapartError::config(line_no, format!("{:?} is not a color index", id)))?;
    if !(1..=COLOR_COUNT).contains(&index) {
        return Err(MapartError::config(
            line_no,
            format!("color index {} outside 1..={}", index, COLOR_COUNT),
        ));
    }
    Ok((index - 1) as u8)
}
