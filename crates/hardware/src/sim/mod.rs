//! Driver memory, image loaders and the top-level drive loop.
//!
//! Everything outside the chip lives here: the RAM model that services
//! the external pin-out exactly like a real memory device, the flat-image
//! and Motorola S-record loaders, and the [`Simulator`] that owns the
//! processor plus memory and steps them together.

/// Flat-binary and S-record loaders.
pub mod loader;
/// Driver RAM model.
pub mod memory;
/// Top-level drive loop.
pub mod simulator;

pub use loader::{LoaderError, load_binary, load_srec};
pub use memory::Memory;
pub use simulator::Simulator;
