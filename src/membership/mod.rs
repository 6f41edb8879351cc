mod client;
mod view;

pub use client::*;
pub use view::*;
