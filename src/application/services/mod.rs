//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `FileSystem` boundary trait but are themselves
//! concrete structs, not traits.

mod dashboard;
mod dataset;
mod render;

pub use dashboard::{DashboardService, ViewContext, MAX_NGRAM};
pub use dataset::{normalize_csv, DatasetService, DropPolicy, DroppedRow, NormalizeReport};
pub use render::{to_json, CountRow, Encoding, Payload, RenderService, RenderedView, View};
