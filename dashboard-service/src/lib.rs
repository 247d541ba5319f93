pub mod charts;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sections;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;

pub use pipeline::{Envelope, Pipeline};
pub use store::{DataStore, TableCache};
