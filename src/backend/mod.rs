//! Backend abstraction layer
//!
//! Generic enumerations, the format translator and the native backend trait.

pub mod conversion;
pub mod dummy;
pub mod gl;
pub mod traits;
pub mod types;

pub use conversion::GlFormatTriple;
pub use dummy::DummyBackend;
pub use traits::*;
pub use types::*;
