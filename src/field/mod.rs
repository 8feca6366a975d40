//! Field Module
//!
//! Data-only types that flow through the engine: the descriptor a caller
//! hands in, the decision a classifier hands back, and the values a rendered
//! control eventually produces.

mod decision;
mod descriptor;
mod value;

pub use decision::{
    Autocapitalization, Decision, DecisionError, EmbeddedContentConfig, InputSpec, KeyboardConfig,
    KeyboardType, MapConfig, MapRegion, NativeConfig, NativeControl, RawDecision, Strategy,
    ValueRange,
};
pub use descriptor::FieldDescriptor;
pub use value::{ColorValue, FieldValue, SignatureValue};
