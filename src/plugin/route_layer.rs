//! Logic relating to requesting region routes and caching the results so
//! several actors asking for the same journey only pay for one search
//!

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::prelude::*;

use crate::plugin::obstacle_layer::EventGraphChanged;
use crate::regions::geometry::GridPoint;
use crate::regions::graph::RegionGraph;
use crate::regions::pathfind::FindState;

/// A request to generate a route from a source position to a target
/// position over the region graph
#[derive(Event)]
pub struct EventRouteRequest {
	/// Where the journey starts
	source: GridPoint,
	/// Where the journey should end
	target: GridPoint,
}

impl EventRouteRequest {
	/// Create a new instance of [EventRouteRequest]
	pub fn new(source: GridPoint, target: GridPoint) -> Self {
		EventRouteRequest { source, target }
	}
	/// Get where the journey starts
	pub fn get_source(&self) -> GridPoint {
		self.source
	}
	/// Get where the journey should end
	pub fn get_target(&self) -> GridPoint {
		self.target
	}
}

/// Describes the properties of a route
#[derive(Clone, Copy, Debug, Reflect)]
pub struct RouteMetadata {
	/// Where the journey starts
	source: GridPoint,
	/// Where the journey should end
	target: GridPoint,
	//? If a game is running for 136 years bad things will start happening here
	/// Marks the route based on time elapsed since app start, used to enable
	/// automatic cleardown of long lived routes that are probably not needed
	/// anymore
	time_generated: Duration,
}

// we don't want to compare `time_generated` so manually impl PartialEq
impl PartialEq for RouteMetadata {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source && self.target == other.target
	}
}
impl Eq for RouteMetadata {}

impl Ord for RouteMetadata {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		(self.source, self.target).cmp(&(other.source, other.target))
	}
}

impl PartialOrd for RouteMetadata {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl RouteMetadata {
	/// Get where the journey starts
	pub fn get_source(&self) -> GridPoint {
		self.source
	}
	/// Get where the journey should end
	pub fn get_target(&self) -> GridPoint {
		self.target
	}
	/// Get when the route was generated
	pub fn get_time_generated(&self) -> Duration {
		self.time_generated
	}
}

/// Each key makes use of custom Ord and Eq implementations comparing only
/// `(source, target)` so a cached route can be looked up without knowing
/// when it was generated. The value is the chain of [FindState]s an actor
/// follows region by region
#[derive(Component, Default, Clone)]
pub struct RouteCache {
	/// Routes keyed by their journey endpoints
	routes: BTreeMap<RouteMetadata, Vec<FindState>>,
}

impl RouteCache {
	/// Get the map of routes
	pub fn get(&self) -> &BTreeMap<RouteMetadata, Vec<FindState>> {
		&self.routes
	}
	/// Get a mutable reference to the map of routes
	pub fn get_mut(&mut self) -> &mut BTreeMap<RouteMetadata, Vec<FindState>> {
		&mut self.routes
	}
	/// Get the route of a journey. Returns [None] if it hasn't been
	/// generated
	pub fn get_route(&self, source: GridPoint, target: GridPoint) -> Option<&Vec<FindState>> {
		let metadata = RouteMetadata {
			source,
			target,
			time_generated: Duration::default(),
		};
		let route = self.routes.get(&metadata);
		trace!("Route: {:?}", route);
		route
	}
	/// Insert a generated route into the cache
	pub fn insert_route(
		&mut self,
		source: GridPoint,
		target: GridPoint,
		elapsed_duration: Duration,
		route: Vec<FindState>,
	) {
		let metadata = RouteMetadata {
			source,
			target,
			time_generated: elapsed_duration,
		};
		self.routes.insert(metadata, route);
	}
	/// Remove a route from the cache
	pub fn remove_route(&mut self, metadata: RouteMetadata) {
		self.routes.remove(&metadata);
	}
}

/// Process [EventRouteRequest] and generate routes over the [RegionGraph]
/// into the [RouteCache]
#[cfg(not(tarpaulin_include))]
pub fn process_route_requests(
	mut events: EventReader<EventRouteRequest>,
	mut query: Query<(&RegionGraph, &mut RouteCache)>,
	time: Res<Time>,
) {
	for event in events.read() {
		for (graph, mut cache) in query.iter_mut() {
			// only run if the cache doesn't contain the route already
			if cache
				.get_route(event.get_source(), event.get_target())
				.is_some()
			{
				continue;
			}
			let Some(start_region) = graph.region_at(event.get_source()) else {
				error!(
					"Route request source {:?} lies outside the grid",
					event.get_source()
				);
				continue;
			};
			if let Some(route) =
				graph.find_path(event.get_source(), start_region, event.get_target())
			{
				debug!("Region route found");
				cache.insert_route(
					event.get_source(),
					event.get_target(),
					time.elapsed(),
					route,
				);
			} else {
				// an expected outcome when the target is walled off or
				// outside the grid, actors poll the cache and may re-request
				debug!(
					"No region route from {:?} to {:?}",
					event.get_source(),
					event.get_target()
				);
			}
		}
	}
}

/// A mutated [RegionGraph] invalidates the regions and portals referenced
/// by every cached route, so discard them all
#[cfg(not(tarpaulin_include))]
pub fn clean_cache(
	mut events: EventReader<EventGraphChanged>,
	mut q_route: Query<&mut RouteCache>,
) {
	if !events.is_empty() {
		events.clear();
		for mut cache in q_route.iter_mut() {
			cache.get_mut().clear();
		}
	}
}

/// Purge any routes older than 15 minutes
#[cfg(not(tarpaulin_include))]
pub fn cleanup_old_routes(mut q_route_cache: Query<&mut RouteCache>, time: Res<Time>) {
	for mut cache in q_route_cache.iter_mut() {
		let mut routes_to_purge = Vec::new();
		for data in cache.get().keys() {
			let elapsed = time.elapsed();
			let diff = elapsed.saturating_sub(data.get_time_generated());
			if diff.as_secs() > 900 {
				routes_to_purge.push(*data);
			}
		}
		for purge in routes_to_purge.iter() {
			cache.remove_route(*purge);
		}
	}
}
