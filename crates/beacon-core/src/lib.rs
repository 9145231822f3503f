pub mod classify;
pub mod error;
pub mod extract;
pub mod input;
pub mod insights;
pub mod lighthouse;
pub mod normalize;
pub mod record;
pub mod report;
pub mod store;

pub use error::{Error, Result};
pub use record::DeviceClass;
