pub mod capability;
pub mod host;
pub mod simulated;


pub use capability::*;
pub use host::{PlayerHost, REPORT_INTERVAL};
pub use simulated::*;
