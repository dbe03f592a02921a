//! Region-level pathfinding over the portal graph. Every region is a single
//! search node no matter how many cells it covers, portals are the edges,
//! and crossing a portal projects the current position through it: the
//! coordinate on the portal's axis snaps to the boundary and the other
//! coordinate is clamped into the portal's span. A movement layer can turn
//! each crossing into an exact cell by stepping one cell along the crossing
//! axis
//!

use bevy::prelude::*;

use crate::regions::geometry::{GridPoint, Range};
use crate::regions::graph::RegionGraph;
use crate::regions::portal::PortalID;
use crate::regions::region::{RegionID, RegionType};
use crate::regions::search::{search, NodeExpander, ScoreType, SearchNode};

/// One step of a region route: a position, the region it lies in and the
/// portal crossed to get there, [None] at the start of the route
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Reflect)]
pub struct FindState {
	/// Position reached by the projection through the crossed portal
	pos: GridPoint,
	/// Region the step travels through
	region: RegionID,
	/// Portal crossed to reach `pos`
	portal: Option<PortalID>,
}

impl FindState {
	/// Create a new instance of [FindState]
	pub fn new(pos: GridPoint, region: RegionID, portal: Option<PortalID>) -> Self {
		FindState {
			pos,
			region,
			portal,
		}
	}
	/// Get the position of the step
	pub fn get_pos(&self) -> GridPoint {
		self.pos
	}
	/// Get the region the step travels through
	pub fn get_region(&self) -> RegionID {
		self.region
	}
	/// Get the portal crossed to reach the step, [None] at the route start
	pub fn get_portal(&self) -> Option<PortalID> {
		self.portal
	}
}

/// Expands [FindState] nodes over a [RegionGraph] toward a goal position
struct RegionExpander<'a> {
	/// The graph being searched
	graph: &'a RegionGraph,
	/// Position the search wants to reach
	end_pos: GridPoint,
}

impl NodeExpander for RegionExpander<'_> {
	type State = FindState;
	fn calc_heuristic(&self, state: &FindState) -> ScoreType {
		state.get_pos().manhattan_distance(&self.end_pos)
	}
	fn is_equal(&self, a: &FindState, b: &FindState) -> bool {
		// all positions within one region collapse to a single node, which
		// keeps the search proportional to the portal count
		a.get_region() == b.get_region()
	}
	fn is_goal(&self, state: &FindState) -> bool {
		self.graph
			.region(state.get_region())
			.get_rect()
			.contains(self.end_pos)
	}
	fn process_neighbours(
		&self,
		node: &SearchNode<FindState>,
		parent_state: Option<&FindState>,
		add: &mut dyn FnMut(FindState, ScoreType),
	) {
		let state = node.get_state();
		let region_id = state.get_region();
		let region = self.graph.region(region_id);
		for portal_id in region.get_portals() {
			let portal = self.graph.portal(*portal_id);
			let other_id = portal.other_region(region_id);
			// no immediate backtrack into the region we came from
			if let Some(parent) = parent_state {
				if parent.get_region() == other_id {
					continue;
				}
			}
			if self.graph.region(other_id).get_region_type() == RegionType::Block {
				continue;
			}
			let side = portal.side_from(region_id);
			let pos = state.get_pos();
			// snap onto the boundary and clamp into the portal's span; the
			// manhattan delta of the projection is the edge cost, which
			// charges one extra cell when crossing toward +axis
			let crossed = pos
				.with_axis_value(side.value_axis(), portal.get_value())
				.with_axis_value(
					side.range_axis(),
					Range::clamp(&portal.get_range(), pos.axis_value(side.range_axis())),
				);
			let edge_cost = pos.manhattan_distance(&crossed);
			add(FindState::new(crossed, other_id, Some(*portal_id)), edge_cost);
		}
	}
}

impl RegionGraph {
	/// Find a low-cost region route from `start_pos` inside `start_region`
	/// to `end_pos`. The caller resolves `start_region` via
	/// [RegionGraph::region_at]. Returns the chain of [FindState]s from the
	/// start (carrying no portal) to the goal region, or [None] when every
	/// reachable region is exhausted without containing `end_pos` - an
	/// expected outcome for unreachable or out-of-grid goals, not an error
	pub fn find_path(
		&self,
		start_pos: GridPoint,
		start_region: RegionID,
		end_pos: GridPoint,
	) -> Option<Vec<FindState>> {
		if self.get_region(start_region).is_none() {
			error!("Start region {:?} is stale", start_region);
			return None;
		}
		let expander = RegionExpander {
			graph: self,
			end_pos,
		};
		let start = FindState::new(start_pos, start_region, None);
		search(&expander, start)
	}
}
