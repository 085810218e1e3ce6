use clap::Args;
use fleetwatch_core::scope::ViewerScope;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Viewer role: admin, official or driver
    #[arg(short, long, default_value = "admin")]
    role: String,

    /// Zone of a zone official
    #[arg(short, long)]
    zone: Option<String>,

    /// Vehicle of a vehicle operator
    #[arg(long)]
    vehicle: Option<String>,
}

impl ScopeArgs {
    pub fn scope(&self) -> ViewerScope {
        let scope =
            ViewerScope::from_role(&self.role, self.zone.as_deref(), self.vehicle.as_deref());

        if scope == ViewerScope::Denied {
            warn!(role = %self.role, "Role does not resolve to a scope, no vehicles will be shown");
        }

        scope
    }
}
