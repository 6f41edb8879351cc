mod controller;
mod teardown;
mod topology;

pub use controller::*;
pub use teardown::*;
pub use topology::*;
