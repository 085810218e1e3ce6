pub mod ids;
pub mod json;
pub mod presentation;
pub mod reconcile;
pub mod route_overlay;
pub mod scope;
pub mod selection;
pub mod vehicle;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
