//! Logic for handling obstacle changes which mutate the [RegionGraph] and
//! invalidate any cached routes referencing the old decomposition
//!

use bevy::prelude::*;

use crate::regions::geometry::Rect;
use crate::regions::graph::RegionGraph;
use crate::regions::region::ObstacleHandle;

/// Request to carve an obstacle rectangle out of the grid
#[derive(Event)]
pub struct EventInsertObstacle {
	/// The cells the obstacle covers
	rect: Rect,
}

impl EventInsertObstacle {
	/// Create a new instance of [EventInsertObstacle]
	pub fn new(rect: Rect) -> Self {
		EventInsertObstacle { rect }
	}
	/// Get the rectangle to block
	pub fn get_rect(&self) -> Rect {
		self.rect
	}
}

/// Request to free a previously inserted obstacle
#[derive(Event)]
pub struct EventRemoveObstacle {
	/// Handle returned when the obstacle was inserted
	handle: ObstacleHandle,
}

impl EventRemoveObstacle {
	/// Create a new instance of [EventRemoveObstacle]
	pub fn new(handle: ObstacleHandle) -> Self {
		EventRemoveObstacle { handle }
	}
	/// Get the handle of the obstacle to free
	pub fn get_handle(&self) -> ObstacleHandle {
		self.handle
	}
}

/// Fired after the [RegionGraph] has been mutated so cached data derived
/// from the old decomposition can be discarded
#[derive(Event)]
pub struct EventGraphChanged;

/// Bookkeeping of the obstacles currently in the graph so game code can
/// look up the handle it needs to request a removal. Merging obstacles can
/// leave a recorded handle pointing at a region that was absorbed into a
/// larger block; such entries are pruned whenever the graph changes
#[derive(Component, Default, Clone)]
pub struct ObstacleRegistry {
	/// Obstacle rectangles as requested and the handle each insertion
	/// returned
	obstacles: Vec<(Rect, ObstacleHandle)>,
}

impl ObstacleRegistry {
	/// Get the recorded `(rectangle, handle)` pairs
	pub fn get(&self) -> &Vec<(Rect, ObstacleHandle)> {
		&self.obstacles
	}
	/// Find the handle recorded for an obstacle rectangle
	pub fn get_handle(&self, rect: &Rect) -> Option<ObstacleHandle> {
		self.obstacles
			.iter()
			.find(|(r, _)| r == rect)
			.map(|(_, handle)| *handle)
	}
	/// Record a freshly inserted obstacle
	pub(crate) fn record(&mut self, rect: Rect, handle: ObstacleHandle) {
		self.obstacles.push((rect, handle));
	}
	/// Drop the record of a removed obstacle
	pub(crate) fn withdraw(&mut self, handle: ObstacleHandle) {
		self.obstacles.retain(|(_, h)| *h != handle);
	}
	/// Drop records whose handle no longer resolves in `graph`
	pub(crate) fn prune(&mut self, graph: &RegionGraph) {
		self.obstacles
			.retain(|(_, handle)| graph.get_region(handle.get()).is_some());
	}
}

/// Apply queued obstacle insertions and removals to the [RegionGraph] and
/// announce the change so stale caches get cleaned
#[cfg(not(tarpaulin_include))]
pub fn process_obstacle_events(
	mut insertions: EventReader<EventInsertObstacle>,
	mut removals: EventReader<EventRemoveObstacle>,
	mut query: Query<(&mut RegionGraph, &mut ObstacleRegistry)>,
	mut graph_changed: EventWriter<EventGraphChanged>,
) {
	let mut changed = false;
	for event in insertions.read() {
		for (mut graph, mut registry) in query.iter_mut() {
			if let Some(handle) = graph.insert_obstacle(event.get_rect()) {
				debug!("Inserted obstacle {:?} as {:?}", event.get_rect(), handle);
				registry.record(event.get_rect(), handle);
				changed = true;
			}
		}
	}
	for event in removals.read() {
		for (mut graph, mut registry) in query.iter_mut() {
			if graph.remove_obstacle(event.get_handle()) {
				debug!("Removed obstacle {:?}", event.get_handle());
				registry.withdraw(event.get_handle());
				changed = true;
			}
		}
	}
	if changed {
		for (graph, mut registry) in query.iter_mut() {
			registry.prune(graph.as_ref());
		}
		graph_changed.write(EventGraphChanged);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::regions::geometry::Range;
	#[test]
	fn registry_lookup_by_rect() {
		let mut graph = RegionGraph::new(10, 10);
		let mut registry = ObstacleRegistry::default();
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		registry.record(rect, handle);
		let result = registry.get_handle(&rect);
		let actual = Some(handle);
		assert_eq!(actual, result);
	}
	#[test]
	fn registry_prunes_absorbed_handles() {
		let mut graph = RegionGraph::new(10, 10);
		let mut registry = ObstacleRegistry::default();
		let first = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let second = Rect::new(Range::new(4, 6), Range::new(2, 4));
		let first_handle = graph.insert_obstacle(first).unwrap();
		registry.record(first, first_handle);
		let second_handle = graph.insert_obstacle(second).unwrap();
		registry.record(second, second_handle);
		registry.prune(&graph);
		// the blocks merged, only the surviving handle remains recorded
		assert_eq!(1, registry.get().len());
		let (_, survivor) = registry.get()[0];
		assert!(graph.get_region(survivor.get()).is_some());
	}
}
