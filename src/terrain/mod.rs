mod ground;
mod section;
mod slice;

pub use ground::{ground_shifts, PositionProfile};
pub use section::TerrainSection;
pub use slice::{Block, PlacedBlock, TerrainSlice};
