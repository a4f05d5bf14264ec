pub mod batch;
pub mod common;
pub mod comparison;
pub mod connection;
pub mod content;
pub mod preflight;
pub mod transfer;

pub use batch::*;
pub use common::*;
pub use comparison::*;
pub use connection::*;
pub use content::*;
pub use preflight::*;
pub use transfer::*;
