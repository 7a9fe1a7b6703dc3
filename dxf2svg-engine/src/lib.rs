pub mod classify;
pub mod emit;
pub mod entity;
pub mod errors;
pub mod extract;
pub mod group;
pub mod normalize;
pub mod pipeline;

pub use classify::{Classification, ShapeCategory};
pub use entity::{CanonicalEntity, EntityKind, Group};
pub use errors::EngineError;
pub use group::Tolerance;
pub use normalize::Canvas;
pub use pipeline::{ConvertOptions, GroupDrawing, convert_document, convert_groups};
