pub mod apply;
pub mod batch_filter;
pub mod classify;
pub mod extra;
pub mod preflight;
pub mod reconciler;
pub mod registry;
pub mod snapshot;

pub use apply::*;
pub use batch_filter::*;
pub use classify::*;
pub use extra::*;
pub use preflight::*;
pub use reconciler::*;
pub use registry::*;
pub use snapshot::*;
