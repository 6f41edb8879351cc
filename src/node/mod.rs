mod endpoint;
mod handle;
mod identity;
mod port_allocator;
mod state;

pub use endpoint::*;
pub use handle::*;
pub use identity::*;
pub use port_allocator::*;
pub use state::*;
