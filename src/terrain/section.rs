use super::slice::{Block, TerrainSlice};
use crate::config::PaletteConfig;
use crate::palette::{Mode, SwatchId};
use mapart_common::Result;
use mapart_structure::StructureWriter;
use std::collections::BTreeMap;
use std::path::Path;

/// One exported tile: a slice per image column with an empty guard slice on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainSection {
    slices: Vec<TerrainSlice>,
}

impl TerrainSection {
    /// Builds the terrain for `columns` (west to east, each north to south), levels it
    /// for `mode` and seals every water block.
    pub fn assemble(columns: &[Vec<SwatchId>], config: &PaletteConfig, mode: Mode) -> Self {
        let slice_len = columns.first().map_or(2, |c| c.len() + 2);
        let mut slices = Vec::with_capacity(columns.len() + 2);
        slices.push(TerrainSlice::empty(slice_len));
        slices.extend(columns.iter().map(|c| TerrainSlice::synthesize(c, config)));
        slices.push(TerrainSlice::empty(slice_len));

        let mut section = TerrainSection { slices };
        match mode {
            Mode::Flat => section.level_flat(),
            Mode::Grounded => section.real_slices_mut().iter_mut().for_each(TerrainSlice::ground),
            Mode::Staircase | Mode::Ascending | Mode::Descending => {}
        }
        section.seal_water();
        section
    }

    pub fn slices(&self) -> &[TerrainSlice] {
        &self.slices
    }

    fn real_slices(&self) -> &[TerrainSlice] {
        &self.slices[1..self.slices.len() - 1]
    }

    fn real_slices_mut(&mut self) -> &mut [TerrainSlice] {
        let end = self.slices.len() - 1;
        &mut self.slices[1..end]
    }

    /// Puts single-layer slices level with two-layer ones (a block resting on its
    /// support), so the whole flat map sits at one height.
    fn level_flat(&mut self) {
        if !self.real_slices().iter().any(|s| s.height() == 2) {
            return;
        }
        for slice in self.slices.iter_mut().filter(|s| s.height() == 1) {
            slice.lift();
        }
    }

    /// Surrounds water with glass on the four horizontal sides wherever there is room.
    fn seal_water(&mut self) {
        for x in 1..self.slices.len() - 1 {
            for (z, height) in self.slices[x].water_blocks() {
                let slice = &mut self.slices[x];
                slice.place_if_free(z - 1, height, Block::Seal);
                slice.place_if_free(z + 1, height, Block::Seal);
                self.slices[x - 1].place_if_free(z, height, Block::Seal);
                self.slices[x + 1].place_if_free(z, height, Block::Seal);
            }
        }
    }

    pub fn count_blocks(&self, config: &PaletteConfig) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for slice in &self.slices {
            slice.count_blocks(config, &mut counts);
        }
        counts
    }

    pub fn add_floor(&mut self) {
        self.slices.iter_mut().for_each(TerrainSlice::add_floor);
    }

    pub fn height(&self) -> i32 {
        self.slices.iter().map(TerrainSlice::height).max().unwrap_or(0)
    }

    pub fn to_structure(&self, config: &PaletteConfig) -> Result<StructureWriter> {
        let depth = self.slices.first().map_or(0, TerrainSlice::len);
        let mut writer = StructureWriter::new(self.slices.len() as i32, self.height(), depth as i32);
        for (x, slice) in self.slices.iter().enumerate() {
            for (z, placed) in slice.iter() {
                writer.place_block(
                    placed.block.block_state(config),
                    x as i32,
                    placed.height,
                    z as i32,
                )?;
            }
        }
        Ok(writer)
    }

    pub fn save(&self, config: &PaletteConfig, path: &Path) -> Result<()> {
        self.to_structure(config)?.write_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WATER_COLOR_ID;
    use crate::palette::Variation::{Darker, Lighter, Normal};
    use crate::terrain::PlacedBlock;
    use mapart_nbt::Tag;

    const STONE: u8 = 10;
    const SAND: u8 = 1;

    fn config() -> PaletteConfig {
        let mut config = PaletteConfig::new("minecraft:cobblestone");
        config.set_block(STONE, "minecraft:stone");
        config.set_block(SAND, "minecraft:sand");
        config.set_needs_support(SAND, true);
        config
    }

    fn uniform(color_id: u8, width: usize, depth: usize) -> Vec<Vec<SwatchId>> {
        vec![vec![SwatchId::new(color_id, Normal); depth]; width]
    }

    #[test]
    fn test_guard_slices_start_empty() {
        let section = TerrainSection::assemble(&uniform(STONE, 3, 4), &config(), Mode::Staircase);
        assert_eq!(section.slices().len(), 5);
        assert!(section.slices()[0].is_empty());
        assert!(section.slices()[4].is_empty());
        assert_eq!(section.slices()[2].len(), 6);
    }

    #[test]
    fn test_flat_uniform_map() {
        let config = config();
        let mut section = TerrainSection::assemble(&uniform(STONE, 4, 4), &config, Mode::Flat);
        section.add_floor();
        assert_eq!(section.height(), 2);

        for slice in &section.slices()[1..5] {
            for z in 1..5 {
                assert_eq!(
                    slice.blocks_at(z),
                    &[
                        PlacedBlock { block: Block::Terrain(STONE), height: 1 },
                        PlacedBlock { block: Block::Seal, height: 0 },
                    ]
                );
            }
        }
        assert!(section
            .slices()
            .iter()
            .all(|s| (0..s.len()).all(|z| s.blocks_at(z).iter().all(|b| !b.block.is_water()))));
    }

    #[test]
    fn test_flat_levels_to_supported_blocks() {
        let mut columns = uniform(STONE, 2, 2);
        columns[1] = vec![SwatchId::new(SAND, Normal); 2];
        let section = TerrainSection::assemble(&columns, &config(), Mode::Flat);

        let stone = section.slices()[1].blocks_at(1)[0];
        let sand = section.slices()[2].blocks_at(1)[0];
        assert_eq!(stone, PlacedBlock { block: Block::Terrain(STONE), height: 1 });
        assert_eq!(sand, PlacedBlock { block: Block::Terrain(SAND), height: 1 });
        // empty guard slices have height 0 and stay put
        assert!(section.slices()[0].is_empty());
    }

    #[test]
    fn test_flat_without_supported_blocks_is_unchanged() {
        let section = TerrainSection::assemble(&uniform(STONE, 2, 2), &config(), Mode::Flat);
        assert_eq!(section.height(), 1);
    }

    #[test]
    fn test_water_is_sealed_on_all_sides() {
        let column = vec![
            SwatchId::new(STONE, Normal),
            SwatchId::new(WATER_COLOR_ID, Lighter),
            SwatchId::new(STONE, Normal),
        ];
        let section = TerrainSection::assemble(&[column], &config(), Mode::Staircase);
        let glass_at = |x: usize, z: usize, height: i32| {
            section.slices()[x]
                .blocks_at(z)
                .contains(&PlacedBlock { block: Block::Seal, height })
        };

        // the water sits at 1 between two stone blocks at 1
        assert!(glass_at(0, 2, 1));
        assert!(glass_at(2, 2, 1));
        assert!(!glass_at(1, 1, 1));
        assert!(!glass_at(1, 3, 1));
        // the seal under the water is still there
        assert!(glass_at(1, 2, 0));
    }

    #[test]
    fn test_grounded_mode_grounds_each_slice() {
        let column = [Lighter, Lighter, Darker, Lighter, Lighter].map(|v| SwatchId::new(STONE, v));
        let staircase = TerrainSection::assemble(&[column.to_vec()], &config(), Mode::Staircase);
        let grounded = TerrainSection::assemble(&[column.to_vec()], &config(), Mode::Grounded);
        assert_eq!(staircase.height(), 4);
        assert_eq!(grounded.height(), 3);
    }

    #[test]
    fn test_counts_and_structure() {
        let config = config();
        let mut section = TerrainSection::assemble(&uniform(SAND, 2, 3), &config, Mode::Staircase);
        let counts = section.count_blocks(&config);
        assert_eq!(counts.get("minecraft:sand"), Some(&6));
        assert_eq!(counts.get("minecraft:cobblestone"), Some(&8));
        assert_eq!(counts.get("minecraft:glass"), None);

        section.add_floor();
        let writer = section.to_structure(&config).unwrap();
        // 14 blocks plus a 4x5 floor
        assert_eq!(writer.block_count(), 14 + 20);
        let nbt = writer.to_nbt();
        let size: Vec<i32> = nbt
            .root
            .get("size")
            .and_then(Tag::as_list)
            .unwrap()
            .iter()
            .map(|t| t.as_i32().unwrap())
            .collect();
        assert_eq!(size, [4, 3, 5]);
    }
}
