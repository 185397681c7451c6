pub mod columns;
pub mod document;
pub mod frame;
pub mod header;
pub mod log;

pub use columns::*;
pub use document::*;
pub use frame::*;
pub use header::*;
pub use log::*;
