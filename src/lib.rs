pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod transform;
pub mod types;

pub use error::{EtlError, ExtractionError, LoadError, Result, SchemaBuildError};
pub use pipeline::{EtlPipeline, RunSummary, Sink};
pub use transform::{PromotionJoin, StarSchema, StarSchemaBuilder};
