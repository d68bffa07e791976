pub mod dispatcher;
pub mod etl;
pub mod flatten;
pub mod governor;
pub mod input;
pub mod pipeline;

pub use crate::domain::model::{EnrichmentOutcome, InputRecord, OutputTable, TransformResult};
pub use crate::domain::ports::{ConfigProvider, EnrichmentClient, Pipeline, Storage};
pub use crate::utils::error::Result;
