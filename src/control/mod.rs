pub mod controller;
pub mod search;


pub use controller::*;
pub use search::*;
