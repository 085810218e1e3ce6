pub mod apply;
pub mod marker;
pub mod plan;

pub use apply::{ApplyOutcome, apply_plan, release_all};
pub use marker::{MarkerRegistry, MarkerState};
pub use plan::{MarkerOperation, ReconcilePlan, reconcile};
