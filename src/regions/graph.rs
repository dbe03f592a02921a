//! The [RegionGraph] owns every [Region] and [Portal] and keeps the
//! decomposition consistent as rectangular obstacles come and go. Inserting
//! an obstacle splits each overlapped region around the overlap, re-homes
//! the portals of the vanished sides onto the leftover sub-regions and
//! merges same-type neighbours back together:
//!
//! ```text
//!  _______________          _______________
//! |               |        |      top      |
//! |     ___       |        |_____ ___ _____|
//! |    |ob-|      |  --->  |     |x x|     |
//! |    |_s_|      |        | left|x_x|right|
//! |               |        |_____|___|_____|
//! |    Normal     |        |    bottom     |
//! |_______________|        |_______________|
//! ```
//!
//! Splitting and merging never leave a gap or an overlap: the regions tile
//! the grid at every observable point and each internal boundary is covered
//! by portals exactly
//!

use bevy::prelude::*;

use crate::regions::geometry::{Axis, GridPoint, Range, Rect, Side};
use crate::regions::portal::{Portal, PortalID};
use crate::regions::region::{ObstacleHandle, Region, RegionID, RegionType};

/// Upper bound of neighbour absorptions in one merge pass, one for each
/// side of the region being grown
const MAX_MERGE_PASSES: usize = 4;

/// Arena storage of one [Region]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
struct RegionSlot {
	/// Bumped whenever the slot's occupant is destroyed so outstanding
	/// [RegionID]s go stale instead of resolving to a reused slot
	generation: u32,
	/// The resident region, [None] while the slot is on the free list
	region: Option<Region>,
}

/// Arena storage of one [Portal]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
struct PortalSlot {
	/// Bumped whenever the slot's occupant is destroyed so outstanding
	/// [PortalID]s go stale instead of resolving to a reused slot
	generation: u32,
	/// The resident portal, [None] while the slot is on the free list
	portal: Option<Portal>,
}

/// The dynamic decomposition of a grid into rectangular regions joined by
/// portals. Obstacles are inserted and removed through
/// [RegionGraph::insert_obstacle]/[RegionGraph::remove_obstacle]; everything
/// else only reads the graph
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Clone, Debug)]
pub struct RegionGraph {
	/// The full grid every region tiles
	bounds: Rect,
	/// Arena of regions addressed by [RegionID]
	region_slots: Vec<RegionSlot>,
	/// Arena of portals addressed by [PortalID]
	portal_slots: Vec<PortalSlot>,
	/// Region slots available for reuse
	free_regions: Vec<u32>,
	/// Portal slots available for reuse
	free_portals: Vec<u32>,
}

impl RegionGraph {
	/// Create a new instance of [RegionGraph] covering a grid `length` cells
	/// wide and `depth` cells deep, seeded with a single free region
	/// spanning the whole grid. Panics if either dimension is zero
	pub fn new(length: u32, depth: u32) -> Self {
		if length == 0 || depth == 0 {
			panic!(
				"Grid dimensions `({}, {})` cannot seed a region graph, both must be positive",
				length, depth
			);
		}
		let bounds = Rect::new(Range::new(0, length as i32), Range::new(0, depth as i32));
		let mut graph = RegionGraph {
			bounds,
			region_slots: Vec::new(),
			portal_slots: Vec::new(),
			free_regions: Vec::new(),
			free_portals: Vec::new(),
		};
		graph.create_region(bounds, RegionType::Normal);
		graph
	}
	/// Get the rectangle of the whole grid
	pub fn get_bounds(&self) -> Rect {
		self.bounds
	}
	/// Resolve a handle to its [Region], [None] if the region has since
	/// been destroyed
	pub fn get_region(&self, id: RegionID) -> Option<&Region> {
		let slot = self.region_slots.get(id.get_index() as usize)?;
		if slot.generation != id.get_generation() {
			return None;
		}
		slot.region.as_ref()
	}
	/// Resolve a handle to its [Portal], [None] if the portal has since
	/// been destroyed
	pub fn get_portal(&self, id: PortalID) -> Option<&Portal> {
		let slot = self.portal_slots.get(id.get_index() as usize)?;
		if slot.generation != id.get_generation() {
			return None;
		}
		slot.portal.as_ref()
	}
	/// Iterate over every live region
	pub fn regions(&self) -> impl Iterator<Item = (RegionID, &Region)> {
		self.region_slots.iter().enumerate().filter_map(|(i, slot)| {
			slot.region
				.as_ref()
				.map(|region| (RegionID::new(i as u32, slot.generation), region))
		})
	}
	/// Iterate over every live portal
	pub fn portals(&self) -> impl Iterator<Item = (PortalID, &Portal)> {
		self.portal_slots.iter().enumerate().filter_map(|(i, slot)| {
			slot.portal
				.as_ref()
				.map(|portal| (PortalID::new(i as u32, slot.generation), portal))
		})
	}
	/// Find the region containing the cell at `point`, [None] if the point
	/// lies outside the grid
	pub fn region_at(&self, point: GridPoint) -> Option<RegionID> {
		self.regions()
			.find(|(_, region)| region.get_rect().contains(point))
			.map(|(id, _)| id)
	}
	/// Resolve a region the graph guarantees to be live. Only for internal
	/// use where a stale handle means the engine itself broke an invariant
	pub(crate) fn region(&self, id: RegionID) -> &Region {
		match self.get_region(id) {
			Some(region) => region,
			None => panic!("Region {:?} is not resident in the graph", id),
		}
	}
	/// Mutable form of [RegionGraph::region]
	fn region_mut(&mut self, id: RegionID) -> &mut Region {
		let slot = &mut self.region_slots[id.get_index() as usize];
		if slot.generation != id.get_generation() {
			panic!("Region {:?} is not resident in the graph", id);
		}
		match slot.region.as_mut() {
			Some(region) => region,
			None => panic!("Region {:?} is not resident in the graph", id),
		}
	}
	/// Resolve a portal the graph guarantees to be live. Only for internal
	/// use where a stale handle means the engine itself broke an invariant
	pub(crate) fn portal(&self, id: PortalID) -> &Portal {
		match self.get_portal(id) {
			Some(portal) => portal,
			None => panic!("Portal {:?} is not resident in the graph", id),
		}
	}
	/// Mutable form of [RegionGraph::portal]
	fn portal_mut(&mut self, id: PortalID) -> &mut Portal {
		let slot = &mut self.portal_slots[id.get_index() as usize];
		if slot.generation != id.get_generation() {
			panic!("Portal {:?} is not resident in the graph", id);
		}
		match slot.portal.as_mut() {
			Some(portal) => portal,
			None => panic!("Portal {:?} is not resident in the graph", id),
		}
	}
	/// Place a new region in the arena
	fn create_region(&mut self, rect: Rect, region_type: RegionType) -> RegionID {
		let region = Region::new(rect, region_type);
		if let Some(index) = self.free_regions.pop() {
			let slot = &mut self.region_slots[index as usize];
			slot.region = Some(region);
			RegionID::new(index, slot.generation)
		} else {
			let index = self.region_slots.len() as u32;
			self.region_slots.push(RegionSlot {
				generation: 0,
				region: Some(region),
			});
			RegionID::new(index, 0)
		}
	}
	/// Remove a region from the arena, invalidating outstanding handles
	fn destroy_region(&mut self, id: RegionID) {
		let slot = &mut self.region_slots[id.get_index() as usize];
		debug_assert_eq!(slot.generation, id.get_generation());
		slot.region = None;
		slot.generation += 1;
		self.free_regions.push(id.get_index());
	}
	/// Place a new portal in the arena and record it on both endpoints
	fn create_portal(
		&mut self,
		value: i32,
		range: Range,
		side: Side,
		from: RegionID,
		to: RegionID,
	) -> PortalID {
		debug_assert!(!range.is_empty());
		let portal = Portal::new(value, range, side, from, to);
		let id = if let Some(index) = self.free_portals.pop() {
			let slot = &mut self.portal_slots[index as usize];
			slot.portal = Some(portal);
			PortalID::new(index, slot.generation)
		} else {
			let index = self.portal_slots.len() as u32;
			self.portal_slots.push(PortalSlot {
				generation: 0,
				portal: Some(portal),
			});
			PortalID::new(index, 0)
		};
		self.region_mut(from).attach_portal(id);
		self.region_mut(to).attach_portal(id);
		id
	}
	/// Remove a portal from the arena, invalidating outstanding handles.
	/// Callers detach it from any surviving endpoint first
	fn destroy_portal(&mut self, id: PortalID) {
		let slot = &mut self.portal_slots[id.get_index() as usize];
		debug_assert_eq!(slot.generation, id.get_generation());
		slot.portal = None;
		slot.generation += 1;
		self.free_portals.push(id.get_index());
	}
}

impl RegionGraph {
	/// Carve the rectangle `rect` out of the grid as an impassable obstacle
	/// and return a handle for later removal. Overlapping existing regions
	/// of any type is legal, as is re-covering existing obstacles; the
	/// rectangle is clipped to the grid. Returns [None] and logs an error
	/// for an empty rectangle or one lying wholly outside the grid
	pub fn insert_obstacle(&mut self, rect: Rect) -> Option<ObstacleHandle> {
		if rect.is_empty() {
			error!("Obstacle rectangle {:?} has no area", rect);
			return None;
		}
		let overlapped: Vec<RegionID> = self
			.regions()
			.filter(|(_, region)| region.get_rect().intersection(&rect).is_some())
			.map(|(id, _)| id)
			.collect();
		if overlapped.is_empty() {
			error!(
				"Obstacle rectangle {:?} lies outside the grid {:?}",
				rect, self.bounds
			);
			return None;
		}
		// split every overlapped region around the obstacle, the covered
		// core of each becomes a transient block
		let mut covered = Vec::new();
		let mut leftovers = Vec::new();
		for region_id in overlapped {
			let Some(ears) = self.split(region_id, &rect) else {
				continue;
			};
			for side in Side::ALL {
				if let Some(ear_id) = ears[side.index()] {
					self.build_portal(ear_id, region_id, side.inverse());
					leftovers.push(ear_id);
				}
			}
			covered.push(region_id);
		}
		// coalesce the covered pieces into maximal blocks while they are
		// still transient and cannot be observed
		for region_id in covered.clone() {
			if self.get_region(region_id).is_some() {
				self.merge_region(region_id, MAX_MERGE_PASSES);
			}
		}
		covered.retain(|id| self.get_region(*id).is_some());
		for region_id in covered.iter() {
			self.region_mut(*region_id).set_region_type(RegionType::Block);
		}
		// a further pass now the pieces are blocks proper lets a touching or
		// overlapping insertion join obstacles inserted earlier
		for region_id in covered.clone() {
			if self.get_region(region_id).is_some() {
				self.merge_region(region_id, MAX_MERGE_PASSES);
			}
		}
		// coalesce the fragmented free space left around the obstacle
		for region_id in leftovers {
			if self.get_region(region_id).is_some() {
				self.merge_region(region_id, MAX_MERGE_PASSES);
			}
		}
		// the covered pieces may themselves have been absorbed into larger
		// blocks by now, resolve the handle by lookup
		let clipped = rect
			.intersection(&self.bounds)
			.expect("an overlapped region implies the obstacle touches the grid");
		let probe = GridPoint::new(clipped.get_x().get_min(), clipped.get_y().get_min());
		let block_id = self
			.region_at(probe)
			.expect("the regions tile the grid");
		debug_assert_eq!(RegionType::Block, self.region(block_id).get_region_type());
		Some(ObstacleHandle::new(block_id))
	}
	/// Free the obstacle behind `handle`, folding its cells back into the
	/// surrounding free space. Returns `false` and logs an error if the
	/// handle is stale or does not name a blocked region
	pub fn remove_obstacle(&mut self, handle: ObstacleHandle) -> bool {
		let region_id = handle.get();
		match self.get_region(region_id) {
			Some(region) if region.get_region_type() == RegionType::Block => {}
			_ => {
				error!("Obstacle handle {:?} is stale or not an obstacle", handle);
				return false;
			}
		}
		self.region_mut(region_id).set_region_type(RegionType::Normal);
		self.merge_region(region_id, MAX_MERGE_PASSES);
		true
	}
	/// Split `region` around the part of `obstacle` it covers. The region
	/// keeps the covered core, becomes a [RegionType::TempBlock] and up to
	/// four leftover sub-regions tile the rest of its old rectangle; the
	/// returned array holds them indexed by [Side]. The cut direction is
	/// chosen to keep the larger leftover dimension in one piece. Returns
	/// [None] if the obstacle does not overlap the region
	fn split(&mut self, region_id: RegionID, obstacle: &Rect) -> Option<[Option<RegionID>; 4]> {
		let outer = self.region(region_id).get_rect();
		let inner = outer.intersection(obstacle)?;
		let dx = outer.get_x().length() - inner.get_x().length();
		let dy = outer.get_y().length() - inner.get_y().length();
		let ears = if dx > dy {
			self.split_vertical(region_id, &outer, &inner)
		} else {
			self.split_horizontal(region_id, &outer, &inner)
		};
		let region = self.region_mut(region_id);
		region.set_rect(inner);
		region.set_region_type(RegionType::TempBlock);
		Some(ears)
	}
	/// Cut with vertical seams: the left/right leftovers span the full
	/// height of the old rectangle, the top/bottom leftovers only the
	/// covered core's columns
	fn split_vertical(
		&mut self,
		region_id: RegionID,
		outer: &Rect,
		inner: &Rect,
	) -> [Option<RegionID>; 4] {
		let region_type = self.region(region_id).get_region_type();
		let mut ears: [Option<RegionID>; 4] = [None; 4];
		if outer.get_x().get_min() < inner.get_x().get_min() {
			let rect = Rect::new(
				Range::new(outer.get_x().get_min(), inner.get_x().get_min()),
				outer.get_y(),
			);
			ears[Side::Left.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_x().get_max() > inner.get_x().get_max() {
			let rect = Rect::new(
				Range::new(inner.get_x().get_max(), outer.get_x().get_max()),
				outer.get_y(),
			);
			ears[Side::Right.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_y().get_max() > inner.get_y().get_max() {
			let rect = Rect::new(
				inner.get_x(),
				Range::new(inner.get_y().get_max(), outer.get_y().get_max()),
			);
			ears[Side::Top.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_y().get_min() < inner.get_y().get_min() {
			let rect = Rect::new(
				inner.get_x(),
				Range::new(outer.get_y().get_min(), inner.get_y().get_min()),
			);
			ears[Side::Bottom.index()] = Some(self.create_region(rect, region_type));
		}
		// absent flanking leftovers hand their boundary segments to the
		// top/bottom leftovers instead
		let mut top_mask = Side::Top.bit();
		let mut bottom_mask = Side::Bottom.bit();
		if let Some(left) = ears[Side::Left.index()] {
			self.update_portal(
				region_id,
				left,
				Side::Left.bit() | Side::Top.bit() | Side::Bottom.bit(),
				false,
			);
			if let Some(top) = ears[Side::Top.index()] {
				self.build_portal(left, top, Side::Right);
			}
			if let Some(bottom) = ears[Side::Bottom.index()] {
				self.build_portal(left, bottom, Side::Right);
			}
		} else {
			top_mask |= Side::Left.bit();
			bottom_mask |= Side::Left.bit();
		}
		if let Some(right) = ears[Side::Right.index()] {
			self.update_portal(
				region_id,
				right,
				Side::Right.bit() | Side::Top.bit() | Side::Bottom.bit(),
				false,
			);
			if let Some(top) = ears[Side::Top.index()] {
				self.build_portal(right, top, Side::Left);
			}
			if let Some(bottom) = ears[Side::Bottom.index()] {
				self.build_portal(right, bottom, Side::Left);
			}
		} else {
			top_mask |= Side::Right.bit();
			bottom_mask |= Side::Right.bit();
		}
		if let Some(top) = ears[Side::Top.index()] {
			self.update_portal(region_id, top, top_mask, false);
		}
		if let Some(bottom) = ears[Side::Bottom.index()] {
			self.update_portal(region_id, bottom, bottom_mask, false);
		}
		ears
	}
	/// Cut with horizontal seams: the top/bottom leftovers span the full
	/// width of the old rectangle, the left/right leftovers only the
	/// covered core's rows
	fn split_horizontal(
		&mut self,
		region_id: RegionID,
		outer: &Rect,
		inner: &Rect,
	) -> [Option<RegionID>; 4] {
		let region_type = self.region(region_id).get_region_type();
		let mut ears: [Option<RegionID>; 4] = [None; 4];
		if outer.get_y().get_max() > inner.get_y().get_max() {
			let rect = Rect::new(
				outer.get_x(),
				Range::new(inner.get_y().get_max(), outer.get_y().get_max()),
			);
			ears[Side::Top.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_y().get_min() < inner.get_y().get_min() {
			let rect = Rect::new(
				outer.get_x(),
				Range::new(outer.get_y().get_min(), inner.get_y().get_min()),
			);
			ears[Side::Bottom.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_x().get_min() < inner.get_x().get_min() {
			let rect = Rect::new(
				Range::new(outer.get_x().get_min(), inner.get_x().get_min()),
				inner.get_y(),
			);
			ears[Side::Left.index()] = Some(self.create_region(rect, region_type));
		}
		if outer.get_x().get_max() > inner.get_x().get_max() {
			let rect = Rect::new(
				Range::new(inner.get_x().get_max(), outer.get_x().get_max()),
				inner.get_y(),
			);
			ears[Side::Right.index()] = Some(self.create_region(rect, region_type));
		}
		// absent flanking leftovers hand their boundary segments to the
		// left/right leftovers instead
		let mut left_mask = Side::Left.bit();
		let mut right_mask = Side::Right.bit();
		if let Some(top) = ears[Side::Top.index()] {
			self.update_portal(
				region_id,
				top,
				Side::Top.bit() | Side::Left.bit() | Side::Right.bit(),
				false,
			);
			if let Some(left) = ears[Side::Left.index()] {
				self.build_portal(top, left, Side::Bottom);
			}
			if let Some(right) = ears[Side::Right.index()] {
				self.build_portal(top, right, Side::Bottom);
			}
		} else {
			left_mask |= Side::Top.bit();
			right_mask |= Side::Top.bit();
		}
		if let Some(bottom) = ears[Side::Bottom.index()] {
			self.update_portal(
				region_id,
				bottom,
				Side::Bottom.bit() | Side::Left.bit() | Side::Right.bit(),
				false,
			);
			if let Some(left) = ears[Side::Left.index()] {
				self.build_portal(bottom, left, Side::Top);
			}
			if let Some(right) = ears[Side::Right.index()] {
				self.build_portal(bottom, right, Side::Top);
			}
		} else {
			left_mask |= Side::Bottom.bit();
			right_mask |= Side::Bottom.bit();
		}
		if let Some(left) = ears[Side::Left.index()] {
			self.update_portal(region_id, left, left_mask, false);
		}
		if let Some(right) = ears[Side::Right.index()] {
			self.update_portal(region_id, right, right_mask, false);
		}
		ears
	}
	/// Walk the portals of `origin` on the sides selected by `side_mask`
	/// and hand over every span that now borders `destination`: a portal
	/// lying wholly inside the destination's boundary range is re-homed, a
	/// straddling portal is either clipped in place and re-homed or shrunk
	/// to its unaffected remainder while a fresh portal covering exactly
	/// the overlap is attached to the destination. Disjoint portals are
	/// untouched. Afterwards no two same-side portals of the destination
	/// overlap
	fn update_portal(
		&mut self,
		origin_id: RegionID,
		dest_id: RegionID,
		side_mask: u8,
		clip_in_place: bool,
	) {
		let portal_ids = self.region(origin_id).get_portals().to_vec();
		for portal_id in portal_ids {
			let portal = *self.portal(portal_id);
			let from_side = portal.side_from(origin_id);
			if side_mask & from_side.bit() == 0 {
				continue;
			}
			let dest_range = self
				.region(dest_id)
				.get_rect()
				.range(from_side.range_axis());
			let range = portal.get_range();
			if dest_range.contains_range(&range) {
				self.portal_mut(portal_id).replace_region(origin_id, dest_id);
				self.region_mut(origin_id).detach_portal(portal_id);
				self.region_mut(dest_id).attach_portal(portal_id);
			} else if let Some(cross) = range.intersection(&dest_range) {
				let far_id = portal.other_region(origin_id);
				if clip_in_place {
					self.portal_mut(portal_id).replace_region(origin_id, dest_id);
					self.portal_mut(portal_id).set_range(cross);
					self.region_mut(origin_id).detach_portal(portal_id);
					self.region_mut(dest_id).attach_portal(portal_id);
				} else {
					if cross.get_max() == range.get_max() {
						// |-----------|xxxxxxxxxxx|
						self.portal_mut(portal_id)
							.set_range(Range::new(range.get_min(), cross.get_min()));
					} else if cross.get_min() == range.get_min() {
						// |xxxxxxxxxxx|-----------|
						self.portal_mut(portal_id)
							.set_range(Range::new(cross.get_max(), range.get_max()));
					} else {
						// |-----|xxxxxxxxxxx|-----| keep the high remainder
						// here, the low remainder becomes its own portal
						// between the original pair
						self.portal_mut(portal_id)
							.set_range(Range::new(cross.get_max(), range.get_max()));
						let low = Range::new(range.get_min(), cross.get_min());
						let regions = portal.get_regions();
						self.create_portal(
							portal.get_value(),
							low,
							portal.get_side(),
							regions[0],
							regions[1],
						);
					}
					// the overlap itself becomes a fresh portal owned by
					// the destination
					self.create_portal(portal.get_value(), cross, from_side, dest_id, far_id);
				}
			}
		}
	}
	/// Create the portal between two freshly adjacent regions where `side`
	/// is the direction of travel from `from` into `to` and `to`'s
	/// rectangle spans exactly the shared boundary
	fn build_portal(&mut self, from_id: RegionID, to_id: RegionID, side: Side) -> PortalID {
		let to_rect = self.region(to_id).get_rect();
		let range = to_rect.range(side.range_axis());
		let value = match side {
			Side::Top => to_rect.get_y().get_min(),
			Side::Bottom => to_rect.get_y().get_max(),
			Side::Right => to_rect.get_x().get_min(),
			Side::Left => to_rect.get_x().get_max(),
		};
		self.create_portal(value, range, side, from_id, to_id)
	}
	/// Grow `region` by absorbing same-type neighbours that share a full
	/// boundary, up to `max_passes` of them. The merge is locally greedy:
	/// the first matching neighbour wins each pass, which can leave a
	/// fragmentation a globally optimal coalescing would not. Self-loop
	/// portals produced by merging around a corner are removed before
	/// returning
	fn merge_region(&mut self, region_id: RegionID, max_passes: usize) {
		let mut merges = 0;
		while merges < max_passes {
			if self.merge_adjacent_region(region_id).is_none() {
				break;
			}
			merges += 1;
		}
		let portal_ids = self.region(region_id).get_portals().to_vec();
		for portal_id in portal_ids {
			let Some(portal) = self.get_portal(portal_id) else {
				continue;
			};
			if portal.is_self_loop() {
				self.region_mut(region_id).detach_portal_all(portal_id);
				self.destroy_portal(portal_id);
			}
		}
		self.assert_region_portals(region_id);
	}
	/// Find the first neighbour of `region` with the same type whose
	/// rectangle spans the exact same range along the shared boundary and
	/// absorb it. Returns the id the consumed neighbour had, [None] when no
	/// neighbour qualifies
	fn merge_adjacent_region(&mut self, region_id: RegionID) -> Option<RegionID> {
		let portal_ids = self.region(region_id).get_portals().to_vec();
		for portal_id in portal_ids {
			let portal = *self.portal(portal_id);
			if portal.is_self_loop() {
				// produced by an earlier pass, cleaned by merge_region
				continue;
			}
			let other_id = portal.other_region(region_id);
			if self.region(other_id).get_region_type() != self.region(region_id).get_region_type()
			{
				continue;
			}
			let axis = portal.get_side().range_axis();
			let range1 = self.region(region_id).get_rect().range(axis);
			let range2 = self.region(other_id).get_rect().range(axis);
			if range1 == range2 {
				self.absorb_region(region_id, other_id, portal_id, axis);
				return Some(other_id);
			}
		}
		None
	}
	/// Fold `other` into `region` across the seam portal `portal_id`. The
	/// consumed region's portals are re-homed onto the survivor, except
	/// that a portal continuing one of the survivor's own seam-flanking
	/// portals toward the same far region is coalesced into it end-to-end.
	/// `axis` is the axis the seam portal's range runs along
	fn absorb_region(
		&mut self,
		region_id: RegionID,
		other_id: RegionID,
		portal_id: PortalID,
		axis: Axis,
	) {
		let seam = self.portal(portal_id).get_value();
		// the survivor's perpendicular portals ending on the seam, slotted
		// by which of the two perpendicular sides they sit on
		let mut flank_portals: [Option<PortalID>; 2] = [None, None];
		let mut flank_regions: [Option<RegionID>; 2] = [None, None];
		for pid in self.region(region_id).get_portals() {
			let portal = self.portal(*pid);
			if portal.is_self_loop() {
				continue;
			}
			if portal.get_side().range_axis() != axis
				&& (portal.get_range().get_min() == seam
					|| portal.get_range().get_max() == seam)
			{
				let slot = if portal.side_from(region_id).is_increasing() {
					0
				} else {
					1
				};
				flank_portals[slot] = Some(*pid);
				flank_regions[slot] = Some(portal.other_region(region_id));
			}
		}
		let other_portal_ids = self.region(other_id).get_portals().to_vec();
		for pid in other_portal_ids {
			if pid == portal_id {
				continue;
			}
			let portal = *self.portal(pid);
			if portal.get_side().range_axis() != axis
				&& (portal.get_range().get_min() == seam
					|| portal.get_range().get_max() == seam)
			{
				let slot = if portal.side_from(other_id).is_increasing() {
					0
				} else {
					1
				};
				let far_id = portal.other_region(other_id);
				if flank_regions[slot] == Some(far_id) {
					// continuation of the survivor's flanking portal, grow
					// it across the seam instead of keeping two portals
					let flank_id =
						flank_portals[slot].expect("flank portal recorded with its region");
					let flank_range = self.portal(flank_id).get_range();
					let joined = if flank_range.get_max() == portal.get_range().get_min() {
						Range::new(flank_range.get_min(), portal.get_range().get_max())
					} else {
						Range::new(portal.get_range().get_min(), flank_range.get_max())
					};
					self.portal_mut(flank_id).set_range(joined);
					self.region_mut(far_id).detach_portal(pid);
					self.destroy_portal(pid);
					continue;
				}
			}
			self.portal_mut(pid).replace_region(other_id, region_id);
			self.region_mut(region_id).attach_portal(pid);
		}
		// grow the survivor across the seam
		let merge_axis = axis.perpendicular();
		let range1 = self.region(region_id).get_rect().range(merge_axis);
		let range2 = self.region(other_id).get_rect().range(merge_axis);
		assert!(
			range1.get_max() == range2.get_min() || range1.get_min() == range2.get_max(),
			"Merging regions {:?} and {:?} do not sit end-to-end",
			region_id,
			other_id
		);
		let joined = if range1.get_max() == range2.get_min() {
			Range::new(range1.get_min(), range2.get_max())
		} else {
			Range::new(range2.get_min(), range1.get_max())
		};
		let mut rect = self.region(region_id).get_rect();
		rect.set_range(merge_axis, joined);
		self.region_mut(region_id).set_rect(rect);
		self.region_mut(region_id).detach_portal(portal_id);
		self.destroy_portal(portal_id);
		self.destroy_region(other_id);
	}
	/// Check the portal set of `region` after a merge: every portal must
	/// still touch the region and keep two distinct endpoints. A failure
	/// here is a defect in the engine, not in caller input
	fn assert_region_portals(&self, region_id: RegionID) {
		for portal_id in self.region(region_id).get_portals() {
			let portal = self.portal(*portal_id);
			assert!(
				!portal.is_self_loop(),
				"Portal {:?} endpoints collapsed onto one region",
				portal
			);
			assert!(
				portal.connects(region_id),
				"Portal {:?} does not touch region {:?}",
				portal,
				region_id
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	/// Sum of the areas of every live region
	fn total_area(graph: &RegionGraph) -> i64 {
		graph.regions().map(|(_, r)| r.get_rect().area()).sum()
	}
	/// Sum of the areas of live regions of one type
	fn area_of_type(graph: &RegionGraph, region_type: RegionType) -> i64 {
		graph
			.regions()
			.filter(|(_, r)| r.get_region_type() == region_type)
			.map(|(_, r)| r.get_rect().area())
			.sum()
	}
	/// Number of live regions of one type
	fn count_of_type(graph: &RegionGraph, region_type: RegionType) -> usize {
		graph
			.regions()
			.filter(|(_, r)| r.get_region_type() == region_type)
			.count()
	}
	#[test]
	fn new_graph_is_one_free_region() {
		let graph = RegionGraph::new(10, 10);
		let result = graph.regions().count();
		let actual = 1;
		assert_eq!(actual, result);
		assert_eq!(100, total_area(&graph));
	}
	#[test]
	#[should_panic]
	fn zero_sized_grid() {
		RegionGraph::new(0, 10);
	}
	#[test]
	fn empty_obstacle_rejected() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 2), Range::new(2, 4));
		let result = graph.insert_obstacle(rect);
		let actual = None;
		assert_eq!(actual, result);
	}
	#[test]
	fn out_of_bounds_obstacle_rejected() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(20, 24), Range::new(2, 4));
		let result = graph.insert_obstacle(rect);
		let actual = None;
		assert_eq!(actual, result);
	}
	#[test]
	fn single_obstacle_block_coverage() {
		// a 10x10 grid with a 2x2 obstacle leaves one block of area 4 and
		// free coverage of area 96
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		assert_eq!(1, count_of_type(&graph, RegionType::Block));
		assert_eq!(4, area_of_type(&graph, RegionType::Block));
		assert_eq!(96, area_of_type(&graph, RegionType::Normal));
		assert_eq!(0, count_of_type(&graph, RegionType::TempBlock));
		assert_eq!(100, total_area(&graph));
		let block = graph.get_region(handle.get()).unwrap();
		assert_eq!(rect, block.get_rect());
	}
	#[test]
	fn obstacle_clipped_to_grid() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(8, 14), Range::new(8, 14));
		let handle = graph.insert_obstacle(rect).unwrap();
		let block = graph.get_region(handle.get()).unwrap();
		let actual = Rect::new(Range::new(8, 10), Range::new(8, 10));
		assert_eq!(actual, block.get_rect());
		assert_eq!(100, total_area(&graph));
	}
	#[test]
	fn touching_obstacles_merge_into_one_block() {
		let mut graph = RegionGraph::new(10, 10);
		graph
			.insert_obstacle(Rect::new(Range::new(2, 4), Range::new(2, 4)))
			.unwrap();
		let handle = graph
			.insert_obstacle(Rect::new(Range::new(4, 6), Range::new(2, 4)))
			.unwrap();
		assert_eq!(1, count_of_type(&graph, RegionType::Block));
		let block = graph.get_region(handle.get()).unwrap();
		let actual = Rect::new(Range::new(2, 6), Range::new(2, 4));
		assert_eq!(actual, block.get_rect());
		// the union block has no portal looping back onto itself
		for (_, portal) in graph.portals() {
			assert!(!portal.is_self_loop());
		}
	}
	#[test]
	fn overlapping_obstacles_merge_into_one_block() {
		let mut graph = RegionGraph::new(10, 10);
		graph
			.insert_obstacle(Rect::new(Range::new(2, 4), Range::new(2, 4)))
			.unwrap();
		let handle = graph
			.insert_obstacle(Rect::new(Range::new(3, 5), Range::new(2, 4)))
			.unwrap();
		assert_eq!(1, count_of_type(&graph, RegionType::Block));
		let block = graph.get_region(handle.get()).unwrap();
		let actual = Rect::new(Range::new(2, 5), Range::new(2, 4));
		assert_eq!(actual, block.get_rect());
		assert_eq!(6, area_of_type(&graph, RegionType::Block));
		assert_eq!(94, area_of_type(&graph, RegionType::Normal));
	}
	#[test]
	fn remove_sole_obstacle_restores_full_grid() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		assert!(graph.remove_obstacle(handle));
		let result = graph.regions().count();
		let actual = 1;
		assert_eq!(actual, result);
		let (_, region) = graph.regions().next().unwrap();
		assert_eq!(graph.get_bounds(), region.get_rect());
		assert_eq!(RegionType::Normal, region.get_region_type());
		assert_eq!(0, graph.portals().count());
	}
	#[test]
	fn stale_handle_rejected() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		assert!(graph.remove_obstacle(handle));
		// the region behind the handle is free space again, removing it a
		// second time must be refused
		let result = graph.remove_obstacle(handle);
		let actual = false;
		assert_eq!(actual, result);
	}
	#[test]
	fn region_at_finds_block_and_free() {
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		let result = graph.region_at(GridPoint::new(3, 3)).unwrap();
		assert_eq!(handle.get(), result);
		let free = graph.region_at(GridPoint::new(0, 0)).unwrap();
		assert_eq!(
			RegionType::Normal,
			graph.get_region(free).unwrap().get_region_type()
		);
		assert_eq!(None, graph.region_at(GridPoint::new(10, 3)));
	}
	#[test]
	fn portals_tile_block_boundary() {
		// the interior obstacle touches free space on all four sides, so
		// its portals must tile its entire perimeter
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(2, 4), Range::new(2, 4));
		let handle = graph.insert_obstacle(rect).unwrap();
		let block = graph.get_region(handle.get()).unwrap();
		for side in Side::ALL {
			let expected = block.get_rect().range(side.range_axis());
			let mut spans: Vec<Range> = block
				.get_portals()
				.iter()
				.filter(|pid| graph.get_portal(**pid).unwrap().side_from(handle.get()) == side)
				.map(|pid| graph.get_portal(*pid).unwrap().get_range())
				.collect();
			spans.sort_by_key(|range| range.get_min());
			assert!(!spans.is_empty());
			assert_eq!(expected.get_min(), spans.first().unwrap().get_min());
			assert_eq!(expected.get_max(), spans.last().unwrap().get_max());
			for pair in spans.windows(2) {
				assert_eq!(pair[0].get_max(), pair[1].get_min());
			}
		}
	}
	#[test]
	fn corner_obstacle_two_leftovers() {
		// an obstacle in the grid corner only leaves leftovers on two sides
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(0, 3), Range::new(0, 3));
		let handle = graph.insert_obstacle(rect).unwrap();
		assert_eq!(1, count_of_type(&graph, RegionType::Block));
		assert_eq!(9, area_of_type(&graph, RegionType::Block));
		assert_eq!(91, area_of_type(&graph, RegionType::Normal));
		let block = graph.get_region(handle.get()).unwrap();
		// no portals on the grid-edge sides
		for portal_id in block.get_portals() {
			let side = graph.get_portal(*portal_id).unwrap().side_from(handle.get());
			assert!(side == Side::Top || side == Side::Right);
		}
	}
	#[test]
	fn full_width_obstacle_splits_free_space() {
		// a wall across the full grid width leaves two disconnected bands
		let mut graph = RegionGraph::new(10, 10);
		let rect = Rect::new(Range::new(0, 10), Range::new(4, 6));
		graph.insert_obstacle(rect).unwrap();
		assert_eq!(2, count_of_type(&graph, RegionType::Normal));
		assert_eq!(1, count_of_type(&graph, RegionType::Block));
		assert_eq!(100, total_area(&graph));
	}
	#[test]
	fn reinsert_over_existing_obstacle() {
		// re-covering blocked cells is legal and keeps the tiling intact
		let mut graph = RegionGraph::new(10, 10);
		graph
			.insert_obstacle(Rect::new(Range::new(2, 6), Range::new(2, 6)))
			.unwrap();
		let handle = graph
			.insert_obstacle(Rect::new(Range::new(3, 5), Range::new(3, 5)))
			.unwrap();
		assert_eq!(100, total_area(&graph));
		assert_eq!(16, area_of_type(&graph, RegionType::Block));
		assert_eq!(
			RegionType::Block,
			graph.get_region(handle.get()).unwrap().get_region_type()
		);
	}
	#[test]
	fn round_trip_restores_type_coverage() {
		// inserting and removing an obstacle restores the free coverage
		// even across pre-existing fragmentation
		let mut graph = RegionGraph::new(12, 12);
		let first = graph
			.insert_obstacle(Rect::new(Range::new(1, 3), Range::new(1, 3)))
			.unwrap();
		let second = graph
			.insert_obstacle(Rect::new(Range::new(7, 9), Range::new(6, 10)))
			.unwrap();
		assert_eq!(132, area_of_type(&graph, RegionType::Normal));
		assert!(graph.remove_obstacle(second));
		assert_eq!(140, area_of_type(&graph, RegionType::Normal));
		assert_eq!(4, area_of_type(&graph, RegionType::Block));
		assert!(graph.remove_obstacle(first));
		assert_eq!(144, area_of_type(&graph, RegionType::Normal));
		assert_eq!(0, count_of_type(&graph, RegionType::Block));
		assert_eq!(144, total_area(&graph));
	}
}
