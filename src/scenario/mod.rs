//! Scenario bindings.
//!
//! Declarative steps (`Given configure seed nodes`, `Then a should fail to
//! join in existing cluster`, ...) are parsed from feature files, bound to
//! [`ClusterController`](crate::ClusterController) calls and executed one
//! scenario at a time, with teardown on every exit path.

mod feature;
mod runner;
mod step;
mod world;

pub use feature::*;
pub use runner::*;
pub use step::*;
pub use world::*;
