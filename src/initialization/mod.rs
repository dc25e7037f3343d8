pub use system::*;

pub mod system;
