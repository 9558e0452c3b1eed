pub mod config;
pub mod dashboard;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sources;
pub mod state;
pub mod store;
pub mod transform;

pub use dashboard::{Dashboard, LoadStatus, LoadTicket};
pub use pipeline::{Dataset, Envelope, IngestError, Pipeline};
pub use state::AppState;
pub use store::{PreferenceChange, PreferenceStore, ViewId};
