//! Voice inventory and persona/name/voice assignment policy.
//!
//! [`catalog::VoiceCatalog`] owns the TTS backend's voice inventory cache;
//! [`allocator::PersonaAllocator`] consumes it to give each persona (and the
//! host) a unique invented name and a distinct voice, per spec.md §4.4-4.5.

pub mod allocator;
pub mod catalog;
pub mod names;

pub use allocator::{AllocationResult, PersonaAllocator, PersonaInput};
pub use catalog::{CatalogVoice, VoiceCatalog};
