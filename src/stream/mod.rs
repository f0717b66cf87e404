//! Stream layer - discrete push streams over the signal runtime.
//!
//! The composition engine does not implement reactive change propagation
//! itself; it expresses streams as thin adapters over spark-signals and
//! builds everything else out of two combinators with opposite semantics
//! (all-must-emit combine vs first-to-emit merge).

mod combine;
mod event;

pub use combine::{combine_latest, merge_streams};
pub use event::{Cleanup, EventStream};

pub(crate) use event::ScopeGuard;
