//! Domain models for media references.

pub mod category;
pub mod environment;
pub mod reference;

pub use category::MediaCategory;
pub use environment::Environment;
pub use reference::ReferenceParts;
