//! Defines the Bevy [Plugin] for the region graph
//!

use bevy::prelude::*;

use crate::plugin::route_layer::RouteMetadata;
use crate::regions::geometry::{GridPoint, Range, Rect, Side};
use crate::regions::pathfind::FindState;
use crate::regions::portal::PortalID;
use crate::regions::region::{RegionID, RegionType};

pub mod obstacle_layer;
pub mod route_layer;

/// Orders the systems so stale data is tidied away before this tick's
/// obstacle changes and route requests are calculated
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Cache aging and purging
	Tidy,
	/// Graph mutation and route generation
	Calculate,
}

/// Registers the events, reflected types and systems driving the region
/// graph
pub struct RegionGraphPlugin;

impl Plugin for RegionGraphPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Range>()
			.register_type::<Rect>()
			.register_type::<GridPoint>()
			.register_type::<Side>()
			.register_type::<RegionID>()
			.register_type::<RegionType>()
			.register_type::<PortalID>()
			.register_type::<FindState>()
			.register_type::<RouteMetadata>()
			.add_event::<obstacle_layer::EventInsertObstacle>()
			.add_event::<obstacle_layer::EventRemoveObstacle>()
			.add_event::<obstacle_layer::EventGraphChanged>()
			.add_event::<route_layer::EventRouteRequest>()
			.configure_sets(Update, (OrderingSet::Tidy, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					route_layer::cleanup_old_routes.in_set(OrderingSet::Tidy),
					(
						obstacle_layer::process_obstacle_events,
						route_layer::clean_cache,
						route_layer::process_route_requests,
					)
						.chain()
						.in_set(OrderingSet::Calculate),
				),
			);
	}
}
