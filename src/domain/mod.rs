mod filter;
mod link;
mod types;

pub use filter::*;
pub use link::*;
pub use types::*;
