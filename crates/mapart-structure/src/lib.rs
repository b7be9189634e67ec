pub mod block_state;
pub mod writer;

pub use block_state::BlockState;
pub use writer::{StructureWriter, DATA_VERSION};
