//! Component bundle an entity needs to host a region graph and its caches
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Everything an entity needs for obstacle bookkeeping and region routing
/// over one grid
#[derive(Bundle)]
pub struct RegionGraphBundle {
	/// The decomposition of the grid into regions and portals
	region_graph: RegionGraph,
	/// Obstacle rectangles mapped to the handles needed to remove them
	obstacle_registry: ObstacleRegistry,
	/// Generated routes keyed by their journey endpoints
	route_cache: RouteCache,
}

impl RegionGraphBundle {
	/// Create a new instance of [RegionGraphBundle] for a grid `length`
	/// cells wide and `depth` cells deep. Panics if either dimension is
	/// zero
	pub fn new(length: u32, depth: u32) -> Self {
		let region_graph = RegionGraph::new(length, depth);
		let obstacle_registry = ObstacleRegistry::default();
		let route_cache = RouteCache::default();
		RegionGraphBundle {
			region_graph,
			obstacle_registry,
			route_cache,
		}
	}
}
