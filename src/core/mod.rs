pub mod etl;
pub mod pipeline;
pub mod transform;

pub use crate::domain::model::{Listing, ListingsPage, LoadSummary, QuoteRow, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, QuoteStore};
pub use crate::utils::error::Result;
