pub mod config;
pub mod loop_region;
pub mod slot;


pub use config::*;
pub use loop_region::*;
pub use slot::*;
