pub mod aggregate;
pub mod classify;
pub mod etl;
pub mod partition;
pub mod pipeline;
pub mod resource;

pub use crate::domain::model::{
    AggregatedRow, AggregatedTable, DataType, ExtractResult, OutputRecord, RawTable,
    TransformResult,
};
pub use crate::domain::ports::{CountryLookup, ErrorSink, Pipeline, Storage};
pub use crate::utils::error::Result;
