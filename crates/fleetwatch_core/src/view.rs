use tracing::{debug, warn};

use crate::{
    ids::VehicleId,
    presentation::{PresentationAdapter, PresentationError},
    reconcile::{MarkerRegistry, apply_plan, reconcile, release_all},
    route_overlay::{RouteAction, RouteOverlay, desired_route, plan_route},
    scope::ViewerScope,
    selection::{SelectionChange, SelectionState},
    vehicle::snapshot::FleetSnapshot,
};

#[derive(Debug, Default)]
pub struct ViewUpdate {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub selection: SelectionChange,
    pub errors: Vec<PresentationError>,
}

impl ViewUpdate {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0 && self.errors.is_empty()
    }
}

/// One mounted fleet map: the viewer's scope, the drawing surface and
/// everything currently rendered on it.
pub struct FleetView<A: PresentationAdapter> {
    scope: ViewerScope,
    adapter: A,
    markers: MarkerRegistry<A::MarkerHandle>,
    route: Option<RouteOverlay<A::RouteHandle>>,
    selection: SelectionState,
    latest: Option<FleetSnapshot>,
    last_sequence: Option<u64>,
}

impl<A: PresentationAdapter> FleetView<A> {
    pub fn new(scope: ViewerScope, adapter: A) -> Self {
        Self {
            scope,
            adapter,
            markers: MarkerRegistry::new(),
            route: None,
            selection: SelectionState::new(),
            latest: None,
            last_sequence: None,
        }
    }

    pub fn scope(&self) -> &ViewerScope {
        &self.scope
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn markers(&self) -> &MarkerRegistry<A::MarkerHandle> {
        &self.markers
    }

    pub fn route(&self) -> Option<&RouteOverlay<A::RouteHandle>> {
        self.route.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The latest snapshot after scope filtering.
    pub fn latest(&self) -> Option<&FleetSnapshot> {
        self.latest.as_ref()
    }

    /// Snapshots are applied in the order they are delivered, even when their
    /// sequence numbers go backwards.
    pub fn apply_snapshot(&mut self, snapshot: FleetSnapshot) -> ViewUpdate {
        if let (Some(last), Some(sequence)) = (self.last_sequence, snapshot.sequence()) {
            if sequence < last {
                warn!(sequence, last, "Applying fleet snapshot older than the previous one");
            }
        }
        if snapshot.sequence().is_some() {
            self.last_sequence = snapshot.sequence();
        }

        let filtered = self.scope.filter(snapshot);
        let plan = reconcile(&self.markers, &filtered);

        let registry = std::mem::take(&mut self.markers);
        let outcome = apply_plan(registry, &plan, &mut self.adapter);
        self.markers = outcome.registry;
        let (created, updated, removed) = (outcome.created, outcome.updated, outcome.removed);

        let selection = self.selection.on_snapshot(&filtered);
        let mut errors = outcome.errors;
        errors.extend(sync_route(&self.selection, &mut self.route, &mut self.adapter));

        debug!(
            vehicles = filtered.len(),
            removed,
            updated,
            created,
            failed = errors.len(),
            "Applied fleet snapshot"
        );

        self.latest = Some(filtered);

        ViewUpdate {
            created,
            updated,
            removed,
            selection,
            errors,
        }
    }

    pub fn select(&mut self, vehicle_id: impl Into<VehicleId>) -> ViewUpdate {
        let selection = self.selection.select(vehicle_id.into(), self.latest.as_ref());
        let errors = sync_route(&self.selection, &mut self.route, &mut self.adapter);

        ViewUpdate {
            selection,
            errors,
            ..ViewUpdate::default()
        }
    }

    pub fn clear_selection(&mut self) -> ViewUpdate {
        let selection = self.selection.clear();
        let errors = sync_route(&self.selection, &mut self.route, &mut self.adapter);

        ViewUpdate {
            selection,
            errors,
            ..ViewUpdate::default()
        }
    }

    /// Unmounts the view: the route and every marker are removed through the
    /// adapter, which is handed back to the caller.
    pub fn teardown(mut self) -> (A, Vec<PresentationError>) {
        self.selection.clear();
        let mut errors = sync_route(&self.selection, &mut self.route, &mut self.adapter);

        let registry = std::mem::take(&mut self.markers);
        errors.extend(release_all(registry, &mut self.adapter));

        (self.adapter, errors)
    }
}

fn sync_route<A: PresentationAdapter>(
    selection: &SelectionState,
    route: &mut Option<RouteOverlay<A::RouteHandle>>,
    adapter: &mut A,
) -> Vec<PresentationError> {
    let mut errors = Vec::new();
    let action = plan_route(route.as_ref(), desired_route(selection.detail()));

    let desired = match action {
        RouteAction::Keep => return errors,
        RouteAction::Remove => None,
        RouteAction::Draw(desired) | RouteAction::Replace(desired) => Some(desired),
    };

    if let Some(overlay) = route.take() {
        let vehicle_id = overlay.vehicle_id().clone();
        if let Err(err) = adapter.remove_route(overlay.into_handle()) {
            warn!(%vehicle_id, error = %err, "Failed to remove route");
            errors.push(PresentationError::RemoveRoute {
                vehicle_id,
                message: err.to_string(),
            });
        }
    }

    if let Some(desired) = desired {
        match adapter.draw_route(desired.points, desired.color) {
            Ok(handle) => {
                *route = Some(RouteOverlay::new(
                    desired.vehicle_id.clone(),
                    desired.points.to_vec(),
                    desired.color.to_owned(),
                    handle,
                ));
            }
            Err(err) => {
                warn!(vehicle_id = %desired.vehicle_id, error = %err, "Failed to draw route");
                errors.push(PresentationError::DrawRoute {
                    vehicle_id: desired.vehicle_id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::{
        ids::ZoneId,
        test_utils::{self, AdapterCall, RecordingAdapter},
    };

    use super::*;

    fn official_view() -> FleetView<RecordingAdapter> {
        FleetView::new(
            ViewerScope::ZoneOfficial {
                zone: ZoneId::new("Z1"),
            },
            RecordingAdapter::default(),
        )
    }

    #[test]
    fn test_view_renders_only_scoped_vehicles() {
        let mut view = official_view();

        let update = view.apply_snapshot(test_utils::snapshot(vec![
            test_utils::routed_record("V1", 14.0, 121.0, &["Z1", "Z2"]),
            test_utils::routed_record("V2", 14.1, 121.1, &["Z3"]),
        ]));

        assert_eq!(update.created, 1);
        assert!(view.markers().contains(&VehicleId::new("V1")));
        assert!(!view.markers().contains(&VehicleId::new("V2")));
        assert_eq!(view.latest().unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_snapshot_is_noop() {
        let mut view = official_view();
        let snapshot = test_utils::snapshot(vec![test_utils::routed_record(
            "V1",
            14.0,
            121.0,
            &["Z1"],
        )]);

        view.apply_snapshot(snapshot.clone());
        let calls = view.adapter().calls().len();

        assert!(view.apply_snapshot(snapshot).is_noop());
        assert_eq!(view.adapter().calls().len(), calls);
    }

    #[test]
    fn test_selection_draws_and_clears_route() {
        let mut view = official_view();
        view.apply_snapshot(test_utils::snapshot(vec![test_utils::routed_record(
            "V1",
            14.0,
            121.0,
            &["Z1"],
        )]));

        let update = view.select("V1");
        assert_eq!(update.selection, SelectionChange::Materialized);
        assert!(view.route().is_some());
        assert_eq!(view.adapter().live_routes(), 1);

        let update = view.clear_selection();
        assert_eq!(update.selection, SelectionChange::Cleared);
        assert!(view.route().is_none());
        assert_eq!(view.adapter().live_routes(), 0);
    }

    #[test]
    fn test_dropout_keeps_route_and_detail() {
        let mut view = official_view();
        view.apply_snapshot(test_utils::snapshot(vec![test_utils::routed_record(
            "V1",
            14.0,
            121.0,
            &["Z1"],
        )]));
        view.select("V1");
        let detail = view.selection().detail().cloned();

        let update = view.apply_snapshot(test_utils::snapshot(vec![]));

        assert_eq!(update.removed, 1);
        assert_eq!(update.selection, SelectionChange::Retained);
        assert_eq!(view.selection().detail().cloned(), detail);
        assert_eq!(view.adapter().live_routes(), 1);
    }

    #[test]
    fn test_pending_selection_materializes_and_draws() {
        let mut view = FleetView::new(ViewerScope::Unrestricted, RecordingAdapter::default());

        assert_eq!(view.select("V1").selection, SelectionChange::Pending);
        assert!(view.route().is_none());

        let update = view.apply_snapshot(test_utils::snapshot(vec![test_utils::routed_record(
            "V1",
            14.0,
            121.0,
            &["Z1"],
        )]));

        assert_eq!(update.selection, SelectionChange::Materialized);
        assert!(view.route().is_some());
    }

    #[test]
    fn test_failed_route_draw_is_reported() {
        let mut adapter = RecordingAdapter::default();
        adapter.fail_route_draws();
        let mut view = FleetView::new(ViewerScope::Unrestricted, adapter);
        view.apply_snapshot(test_utils::snapshot(vec![test_utils::routed_record(
            "V1",
            14.0,
            121.0,
            &["Z1"],
        )]));

        let update = view.select("V1");

        assert_eq!(update.errors.len(), 1);
        assert!(matches!(
            update.errors[0],
            PresentationError::DrawRoute { .. }
        ));
        assert!(view.route().is_none());
        assert!(view.selection().detail().is_some());
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut view = FleetView::new(ViewerScope::Unrestricted, RecordingAdapter::default());
        view.apply_snapshot(test_utils::snapshot(vec![
            test_utils::routed_record("V1", 14.0, 121.0, &["Z1"]),
            test_utils::record("V2", 14.1, 121.1),
        ]));
        view.select("V1");

        let (adapter, errors) = view.teardown();

        assert!(errors.is_empty());
        assert_eq!(adapter.live_markers(), 0);
        assert_eq!(adapter.live_routes(), 0);
        assert!(matches!(
            adapter.calls().last(),
            Some(AdapterCall::RemoveMarker { .. })
        ));
    }

    #[test]
    fn test_failed_create_is_not_counted() {
        let mut adapter = RecordingAdapter::default();
        adapter.fail_creates_for("A");
        let mut view = FleetView::new(ViewerScope::Unrestricted, adapter);

        let update = view.apply_snapshot(test_utils::snapshot(vec![
            test_utils::record("A", 14.0, 121.0),
            test_utils::record("B", 14.1, 121.1),
        ]));

        assert_eq!(update.created, 1);
        assert_eq!(update.errors.len(), 1);
        assert_eq!(view.markers().len(), 1);
        assert!(!view.markers().contains(&VehicleId::new("A")));
    }

    #[test]
    fn test_out_of_order_snapshot_is_still_applied() {
        let mut view = FleetView::new(ViewerScope::Unrestricted, RecordingAdapter::default());
        view.apply_snapshot(
            test_utils::snapshot(vec![test_utils::record("V1", 14.0, 121.0)])
                .with_sequence(Some(5)),
        );

        let update = view.apply_snapshot(
            test_utils::snapshot(vec![test_utils::record("V1", 14.5, 121.0)])
                .with_sequence(Some(4)),
        );

        assert_eq!(update.updated, 1);
        assert_eq!(
            view.markers()
                .get(&VehicleId::new("V1"))
                .unwrap()
                .position()
                .lat(),
            14.5
        );
    }
}
