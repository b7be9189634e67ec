use super::ground::{ground_shifts, PositionProfile};
use crate::config::{ColorBlock, PaletteConfig, GLASS_BLOCK_STATE, WATER_BLOCK_STATE};
use crate::palette::SwatchId;
use std::collections::BTreeMap;
use std::ops::Range;

/// What occupies one voxel. Resolved to a block state only when exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// The configured block for a map color.
    Terrain(u8),
    Support,
    Water,
    /// Glass, used to hold water and as the floor.
    Seal,
}

impl Block {
    pub fn block_state(self, config: &PaletteConfig) -> &str {
        match self {
            Block::Terrain(color_id) => config
                .block_state(color_id)
                .unwrap_or_else(|| config.support_block()),
            Block::Support => config.support_block(),
            Block::Water => WATER_BLOCK_STATE,
            Block::Seal => GLASS_BLOCK_STATE,
        }
    }

    pub fn is_water(self) -> bool {
        self == Block::Water
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBlock {
    pub block: Block,
    pub height: i32,
}

/// The blocks of one image column, from north to south.
///
/// Position 0 is a guard row north of the image holding the block that shades the first
/// row, row `z` of the image lives at position `z + 1`, and the last position is a guard
/// row south of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainSlice {
    positions: Vec<Vec<PlacedBlock>>,
}

impl TerrainSlice {
    /// Slice with `len` positions and no blocks.
    pub fn empty(len: usize) -> Self {
        TerrainSlice {
            positions: vec![Vec::new(); len],
        }
    }

    /// Builds the staircase for one column of swatches, listed north to south.
    ///
    /// Works from the south end: every darker block makes the next block north one
    /// higher, every lighter block one lower. Water is placed as a column whose depth
    /// encodes its shade and never moves the height. Heights are normalized so the lowest
    /// block sits at 0.
    pub fn synthesize(column: &[SwatchId], config: &PaletteConfig) -> Self {
        let mut slice = TerrainSlice::empty(column.len() + 2);
        let mut current_height = 0;

        for (z, swatch) in column.iter().enumerate().rev() {
            let position = z + 1;
            match config.color_block(swatch.color_id) {
                Some(ColorBlock::Fluid) => {
                    let depth = swatch.variation.water_depth();
                    for i in 0..depth {
                        slice.place(position, Block::Water, current_height - i);
                    }
                    slice.place(position, Block::Seal, current_height - depth);
                }
                terrain => {
                    slice.place(position, Block::Terrain(swatch.color_id), current_height);
                    if let Some(ColorBlock::Terrain {
                        needs_support: true,
                        ..
                    }) = terrain
                    {
                        slice.place(position, Block::Support, current_height - 1);
                    }
                    current_height += swatch.variation.height_step();
                }
            }
        }
        slice.place(0, Block::Support, current_height);

        let min_height = slice.blocks().map(|b| b.height).min().unwrap_or(0);
        if min_height < 0 {
            slice.shift(0..slice.len(), -min_height);
        }
        slice
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.iter().all(Vec::is_empty)
    }

    pub fn blocks_at(&self, z: usize) -> &[PlacedBlock] {
        &self.positions[z]
    }

    /// All blocks with their position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PlacedBlock)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .flat_map(|(z, blocks)| blocks.iter().map(move |b| (z, b)))
    }

    fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> + '_ {
        self.positions.iter().flatten()
    }

    fn place(&mut self, z: usize, block: Block, height: i32) {
        self.positions[z].push(PlacedBlock { block, height });
    }

    /// Places `block` unless something already occupies that voxel.
    pub fn place_if_free(&mut self, z: usize, height: i32, block: Block) -> bool {
        let blocks = &mut self.positions[z];
        if blocks.iter().any(|b| b.height == height) {
            return false;
        }
        blocks.push(PlacedBlock { block, height });
        true
    }

    pub fn shift(&mut self, range: Range<usize>, offset: i32) {
        for block in self.positions[range].iter_mut().flatten() {
            block.height += offset;
        }
    }

    pub fn lift(&mut self) {
        self.shift(0..self.len(), 1);
    }

    /// Number of layers used: highest block + 1, or 0 when empty.
    pub fn height(&self) -> i32 {
        self.blocks().map(|b| b.height + 1).max().unwrap_or(0)
    }

    pub fn lowest_height_at(&self, z: usize) -> Option<i32> {
        self.positions[z].iter().map(|b| b.height).min()
    }

    /// Highest block at `z`; the first one placed wins a tie.
    pub fn top_block_at(&self, z: usize) -> Option<PlacedBlock> {
        let blocks = &self.positions[z];
        let top = blocks.iter().map(|b| b.height).max()?;
        blocks.iter().find(|b| b.height == top).copied()
    }

    /// `(position, height)` of every water block inside the image rows.
    pub fn water_blocks(&self) -> Vec<(usize, i32)> {
        self.iter()
            .filter(|(z, b)| *z > 0 && *z < self.len() - 1 && b.block.is_water())
            .map(|(z, b)| (z, b.height))
            .collect()
    }

    /// Pushes staircases down onto the ground, leaving only valleys. The trailing guard
    /// position is left alone.
    pub fn ground(&mut self) {
        let end = self.len().saturating_sub(1);
        let profile: Vec<PositionProfile> = (0..end)
            .map(|z| PositionProfile {
                lowest: self.lowest_height_at(z),
                top: self
                    .top_block_at(z)
                    .map(|b| (b.height, b.block.is_water())),
            })
            .collect();

        for (z, offset) in ground_shifts(&profile).into_iter().enumerate() {
            if offset != 0 {
                self.shift(z..z + 1, offset);
            }
        }
    }

    /// Lifts everything by one and lays a glass floor under every position.
    pub fn add_floor(&mut self) {
        self.lift();
        for z in 0..self.len() {
            self.place(z, Block::Seal, 0);
        }
    }

    pub fn count_blocks(&self, config: &PaletteConfig, counts: &mut BTreeMap<String, usize>) {
        for block in self.blocks() {
            *counts
                .entry(block.block.block_state(config).to_owned())
                .or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WATER_COLOR_ID;
    use crate::palette::Variation::{self, Darker, Lighter, Normal};

    const STONE: u8 = 10;
    const SAND: u8 = 1;

    fn config() -> PaletteConfig {
        let mut config = PaletteConfig::new("minecraft:cobblestone");
        config.set_block(STONE, "minecraft:stone");
        config.set_block(SAND, "minecraft:sand");
        config.set_needs_support(SAND, true);
        config
    }

    fn column(color_id: u8, shades: &[Variation]) -> Vec<SwatchId> {
        shades.iter().map(|&v| SwatchId::new(color_id, v)).collect()
    }

    fn heights(slice: &TerrainSlice) -> Vec<Vec<i32>> {
        (0..slice.len())
            .map(|z| slice.blocks_at(z).iter().map(|b| b.height).collect())
            .collect()
    }

    #[test]
    fn test_flat_column() {
        let slice = TerrainSlice::synthesize(&column(STONE, &[Normal; 4]), &config());
        assert_eq!(slice.len(), 6);
        assert_eq!(
            heights(&slice),
            vec![vec![0], vec![0], vec![0], vec![0], vec![0], vec![]]
        );
        assert_eq!(slice.blocks_at(0)[0].block, Block::Support);
        assert_eq!(slice.blocks_at(3)[0].block, Block::Terrain(STONE));
        assert_eq!(slice.height(), 1);
    }

    #[test]
    fn test_darker_rises_northwards() {
        let slice = TerrainSlice::synthesize(&column(STONE, &[Darker, Darker, Normal]), &config());
        assert_eq!(
            heights(&slice),
            vec![vec![2], vec![1], vec![0], vec![0], vec![]]
        );
    }

    #[test]
    fn test_lighter_is_normalized_to_zero() {
        let slice = TerrainSlice::synthesize(&column(STONE, &[Lighter, Lighter, Lighter]), &config());
        assert_eq!(
            heights(&slice),
            vec![vec![0], vec![1], vec![2], vec![3], vec![]]
        );
        assert_eq!(slice.iter().map(|(_, b)| b.height).min(), Some(0));
    }

    #[test]
    fn test_support_block_below() {
        let slice = TerrainSlice::synthesize(&column(SAND, &[Normal]), &config());
        assert_eq!(
            slice.blocks_at(1),
            &[
                PlacedBlock { block: Block::Terrain(SAND), height: 1 },
                PlacedBlock { block: Block::Support, height: 0 },
            ]
        );
        assert_eq!(slice.blocks_at(0), &[PlacedBlock { block: Block::Support, height: 1 }]);
    }

    #[test]
    fn test_water_depths_and_seal() {
        for (shade, depth) in [(Lighter, 1), (Normal, 5), (Darker, 10)] {
            let mut swatches = column(STONE, &[Normal, Normal]);
            swatches[1] = SwatchId::new(WATER_COLOR_ID, shade);
            let slice = TerrainSlice::synthesize(&swatches, &config());

            let water: Vec<i32> = slice
                .blocks_at(2)
                .iter()
                .filter(|b| b.block.is_water())
                .map(|b| b.height)
                .collect();
            assert_eq!(water.len(), depth as usize);
            let deepest = *water.iter().min().unwrap();
            let seals: Vec<&PlacedBlock> = slice
                .blocks_at(2)
                .iter()
                .filter(|b| b.block == Block::Seal)
                .collect();
            assert_eq!(seals.len(), 1);
            assert_eq!(seals[0].height, deepest - 1);
            assert_eq!(seals[0].height, 0);
            // water does not move the baseline
            assert_eq!(slice.blocks_at(1)[0].height, depth);
            assert_eq!(slice.water_blocks().len(), depth as usize);
        }
    }

    #[test]
    fn test_unconfigured_color_falls_back_to_support_block() {
        let config = config();
        let slice = TerrainSlice::synthesize(&column(40, &[Normal]), &config);
        let block = slice.blocks_at(1)[0].block;
        assert_eq!(block, Block::Terrain(40));
        assert_eq!(block.block_state(&config), "minecraft:cobblestone");
    }

    #[test]
    fn test_place_if_free() {
        let mut slice = TerrainSlice::synthesize(&column(STONE, &[Normal]), &config());
        assert!(!slice.place_if_free(1, 0, Block::Seal));
        assert!(slice.place_if_free(1, 1, Block::Seal));
        assert!(slice.place_if_free(2, 0, Block::Seal));
        assert_eq!(slice.blocks_at(1).len(), 2);
    }

    #[test]
    fn test_ground_flattens_second_staircase() {
        // heights north to south: 0 1 2 1 2 3
        let shades = [Lighter, Lighter, Darker, Lighter, Lighter];
        let mut slice = TerrainSlice::synthesize(&column(STONE, &shades), &config());
        assert_eq!(
            heights(&slice),
            vec![vec![0], vec![1], vec![2], vec![1], vec![2], vec![3], vec![]]
        );

        slice.ground();
        assert_eq!(
            heights(&slice),
            vec![vec![0], vec![1], vec![2], vec![0], vec![1], vec![2], vec![]]
        );
    }

    #[test]
    fn test_floor_and_counts() {
        let config = config();
        let mut slice = TerrainSlice::synthesize(&column(SAND, &[Normal, Normal]), &config);
        let mut counts = BTreeMap::new();
        slice.count_blocks(&config, &mut counts);
        assert_eq!(counts.get("minecraft:sand"), Some(&2));
        assert_eq!(counts.get("minecraft:cobblestone"), Some(&3));

        slice.add_floor();
        assert_eq!(slice.height(), 3);
        for z in 0..slice.len() {
            assert!(slice
                .blocks_at(z)
                .contains(&PlacedBlock { block: Block::Seal, height: 0 }));
        }
    }
}
