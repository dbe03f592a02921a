//! A Region is a maximal axis-aligned rectangle of uniform traversability.
//! Regions live in an arena owned by [crate::prelude::RegionGraph] and are
//! addressed by generation-checked [RegionID] handles so a handle held
//! across a merge can be detected as stale instead of dangling
//!

use bevy::prelude::*;

use crate::regions::{geometry::Rect, portal::PortalID};

/// Generation-checked handle of a [Region] as a `(slot index, generation)`
/// pair. The generation is bumped every time a slot is reused so handles to
/// destroyed regions never resolve
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct RegionID((u32, u32));

impl RegionID {
	/// Create a new instance of [RegionID]
	pub fn new(index: u32, generation: u32) -> Self {
		RegionID((index, generation))
	}
	/// Get the arena slot index
	pub fn get_index(&self) -> u32 {
		self.0 .0
	}
	/// Get the generation the slot had when the handle was issued
	pub fn get_generation(&self) -> u32 {
		self.0 .1
	}
}

/// The traversability of a [Region]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Reflect)]
pub enum RegionType {
	/// Pathable free space
	#[default]
	Normal,
	/// Mid-split placeholder for the covered part of an obstacle, always
	/// resolved to [RegionType::Block] before an insertion returns
	TempBlock,
	/// Impassable obstacle space
	Block,
}

/// A rectangle of uniform traversability plus the portals sitting on its
/// four boundaries. On any one side the portals exactly tile the boundary
/// shared with neighbouring regions, without gaps or overlaps
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Reflect)]
pub struct Region {
	/// The cells the region covers
	rect: Rect,
	/// Traversability of the covered cells
	region_type: RegionType,
	/// Portals touching any of the region's four sides
	portals: Vec<PortalID>,
}

impl Region {
	/// Create a new instance of [Region] with no portals
	pub fn new(rect: Rect, region_type: RegionType) -> Self {
		Region {
			rect,
			region_type,
			portals: Vec::new(),
		}
	}
	/// Get the covered rectangle
	pub fn get_rect(&self) -> Rect {
		self.rect
	}
	/// Replace the covered rectangle
	pub(crate) fn set_rect(&mut self, rect: Rect) {
		self.rect = rect;
	}
	/// Get the traversability
	pub fn get_region_type(&self) -> RegionType {
		self.region_type
	}
	/// Replace the traversability
	pub(crate) fn set_region_type(&mut self, region_type: RegionType) {
		self.region_type = region_type;
	}
	/// Get the portals touching the region's sides
	pub fn get_portals(&self) -> &[PortalID] {
		&self.portals
	}
	/// Record a portal as touching one of the region's sides
	pub(crate) fn attach_portal(&mut self, portal: PortalID) {
		self.portals.push(portal);
	}
	/// Remove one occurrence of `portal` from the incident set
	pub(crate) fn detach_portal(&mut self, portal: PortalID) {
		if let Some(position) = self.portals.iter().position(|p| *p == portal) {
			self.portals.swap_remove(position);
		}
	}
	/// Remove every occurrence of `portal` from the incident set. A portal
	/// collapsed to a self-loop by a merge is attached twice
	pub(crate) fn detach_portal_all(&mut self, portal: PortalID) {
		self.portals.retain(|p| *p != portal);
	}
}

/// Opaque handle to an inserted obstacle, redeemable with
/// [crate::prelude::RegionGraph::remove_obstacle]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct ObstacleHandle(RegionID);

impl ObstacleHandle {
	/// Create a new instance of [ObstacleHandle]
	pub(crate) fn new(region: RegionID) -> Self {
		ObstacleHandle(region)
	}
	/// Get the [RegionID] of the blocked region
	pub fn get(&self) -> RegionID {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::regions::geometry::Range;
	#[test]
	fn detach_single_occurrence() {
		let rect = Rect::new(Range::new(0, 4), Range::new(0, 4));
		let mut region = Region::new(rect, RegionType::Normal);
		let a = PortalID::new(0, 0);
		let b = PortalID::new(1, 0);
		region.attach_portal(a);
		region.attach_portal(b);
		region.attach_portal(a);
		region.detach_portal(a);
		let result = region.get_portals().iter().filter(|p| **p == a).count();
		let actual = 1;
		assert_eq!(actual, result);
	}
	#[test]
	fn detach_all_occurrences() {
		let rect = Rect::new(Range::new(0, 4), Range::new(0, 4));
		let mut region = Region::new(rect, RegionType::Normal);
		let a = PortalID::new(0, 0);
		region.attach_portal(a);
		region.attach_portal(a);
		region.detach_portal_all(a);
		assert!(region.get_portals().is_empty());
	}
}
