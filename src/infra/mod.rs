mod browser;
mod client;

pub use browser::*;
pub use client::*;
