use crate::block_state::BlockState;
use mapart_common::Result;
use mapart_nbt::{NbtFile, Tag};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Data version written into every structure (1.16.4).
pub const DATA_VERSION: i32 = 2567;

struct PlacedState {
    pos: [i32; 3],
    state: i32,
}

/// Accumulates blocks for one structure file.
///
/// Block states get a palette index on first use, in order. Placing a block where one
/// already sits replaces it.
pub struct StructureWriter {
    size: [i32; 3],
    blocks: Vec<PlacedState>,
    block_index: HashMap<[i32; 3], usize>,
    palette: Vec<BlockState>,
    palette_index: HashMap<String, i32>,
}

impl StructureWriter {
    pub fn new(x_size: i32, y_size: i32, z_size: i32) -> Self {
        StructureWriter {
            size: [x_size, y_size, z_size],
            blocks: Vec::new(),
            block_index: HashMap::new(),
            palette: Vec::new(),
            palette_index: HashMap::new(),
        }
    }

    pub fn place_block(&mut self, block_state: &str, x: i32, y: i32, z: i32) -> Result<()> {
        let state = self.state_index(block_state)?;
        let pos = [x, y, z];
        match self.block_index.get(&pos) {
            Some(&existing) => self.blocks[existing].state = state,
            None => {
                self.block_index.insert(pos, self.blocks.len());
                self.blocks.push(PlacedState { pos, state });
            }
        }
        Ok(())
    }

    fn state_index(&mut self, block_state: &str) -> Result<i32> {
        if let Some(&index) = self.palette_index.get(block_state) {
            return Ok(index);
        }
        let parsed = BlockState::parse(block_state)?;
        let index = self.palette.len() as i32;
        self.palette.push(parsed);
        self.palette_index.insert(block_state.to_owned(), index);
        Ok(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn palette(&self) -> &[BlockState] {
        &self.palette
    }

    pub fn to_nbt(&self) -> NbtFile {
        let palette = self.palette.iter().map(BlockState::to_tag).collect();
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                Tag::compound([
                    ("state", Tag::Int(block.state)),
                    ("pos", Tag::int_list(&block.pos)),
                ])
            })
            .collect();

        NbtFile::new(
            "",
            Tag::compound([
                ("DataVersion", Tag::Int(DATA_VERSION)),
                ("size", Tag::int_list(&self.size)),
                ("palette", Tag::List(palette)),
                ("blocks", Tag::List(blocks)),
            ]),
        )
    }

    /// Writes the gzip-compressed structure file, replacing any existing file.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.to_nbt().write_gzip(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mapart_common::MapartError;

    fn list<'a>(file: &'a NbtFile, name: &str) -> &'a [Tag] {
        file.root.get(name).and_then(Tag::as_list).unwrap()
    }

    #[test]
    fn test_palette_indices_follow_first_use() {
        let mut writer = StructureWriter::new(2, 2, 1);
        writer.place_block("minecraft:glass", 0, 0, 0).unwrap();
        writer.place_block("minecraft:stone", 1, 0, 0).unwrap();
        writer.place_block("minecraft:glass", 0, 1, 0).unwrap();

        let nbt = writer.to_nbt();
        let palette = list(&nbt, "palette");
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[1].get("Name").and_then(Tag::as_str), Some("minecraft:stone"));

        let states: Vec<i32> = list(&nbt, "blocks")
            .iter()
            .map(|b| b.get("state").and_then(Tag::as_i32).unwrap())
            .collect();
        assert_eq!(states, [0, 1, 0]);
    }

    #[test]
    fn test_later_placement_wins() {
        let mut writer = StructureWriter::new(1, 1, 1);
        writer.place_block("minecraft:stone", 0, 0, 0).unwrap();
        writer.place_block("minecraft:glass", 0, 0, 0).unwrap();
        assert_eq!(writer.block_count(), 1);

        let nbt = writer.to_nbt();
        let block = &list(&nbt, "blocks")[0];
        assert_eq!(block.get("state").and_then(Tag::as_i32), Some(1));
        assert_eq!(block.get("pos"), Some(&Tag::int_list(&[0, 0, 0])));
    }

    #[test]
    fn test_header_fields() {
        let nbt = StructureWriter::new(130, 3, 130).to_nbt();
        assert_eq!(nbt.root.get("DataVersion"), Some(&Tag::Int(DATA_VERSION)));
        assert_eq!(nbt.root.get("size"), Some(&Tag::int_list(&[130, 3, 130])));
        assert!(list(&nbt, "blocks").is_empty());
    }

    #[test]
    fn test_malformed_state_is_rejected() {
        let mut writer = StructureWriter::new(1, 1, 1);
        assert_matches!(
            writer.place_block("minecraft:water[level", 0, 0, 0),
            Err(MapartError::BlockStateError(_))
        );
        assert_eq!(writer.block_count(), 0);
        assert!(writer.palette().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_is_reported() {
        let mut writer = StructureWriter::new(1, 1, 1);
        writer.place_block("minecraft:stone", 0, 0, 0).unwrap();
        assert_matches!(
            writer.write_to_file(Path::new("/dev/full")),
            Err(MapartError::IoError(_))
        );
    }
}
