//! A Portal is the shared boundary segment between exactly two adjacent
//! Regions and acts as the edge of the region graph. It is pinned at a fixed
//! coordinate on one axis (`value`) and spans a [Range] along the other:
//!
//! ```text
//!  _____________ _____________
//! |             |             |
//! |             P <- value = boundary column,
//! |      A      P    range = shared rows
//! |             |             |
//! |             |______ ______|
//! |             |             |
//! |_____________|_____________|
//! ```
//!

use bevy::prelude::*;

use crate::regions::{
	geometry::{Range, Side},
	region::RegionID,
};

/// Generation-checked handle of a [Portal] as a `(slot index, generation)`
/// pair
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct PortalID((u32, u32));

impl PortalID {
	/// Create a new instance of [PortalID]
	pub fn new(index: u32, generation: u32) -> Self {
		PortalID((index, generation))
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

/// A boundary segment connecting two regions. `side` is the direction of
/// travel from the first endpoint to the second, so the segment sits on the
/// first endpoint's `side` boundary and on the second endpoint's opposite
/// boundary
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Reflect)]
pub struct Portal {
	/// The fixed boundary coordinate, on the axis perpendicular to `range`
	value: i32,
	/// The interval of the boundary the portal spans, a sub-range of both
	/// endpoints' shared boundary
	range: Range,
	/// Direction of travel from the first endpoint to the second
	side: Side,
	/// The two regions the portal connects
	regions: [RegionID; 2],
}

impl Portal {
	/// Create a new instance of [Portal] leading from `from` through its
	/// `side` boundary into `to`
	pub(crate) fn new(value: i32, range: Range, side: Side, from: RegionID, to: RegionID) -> Self {
		Portal {
			value,
			range,
			side,
			regions: [from, to],
		}
	}
	/// Get the fixed boundary coordinate
	pub fn get_value(&self) -> i32 {
		self.value
	}
	/// Get the spanned interval of the boundary
	pub fn get_range(&self) -> Range {
		self.range
	}
	/// Replace the spanned interval of the boundary
	pub(crate) fn set_range(&mut self, range: Range) {
		self.range = range;
	}
	/// Get the direction of travel from the first endpoint to the second
	pub fn get_side(&self) -> Side {
		self.side
	}
	/// Get both endpoint regions
	pub fn get_regions(&self) -> [RegionID; 2] {
		self.regions
	}
	/// Whether `region` is one of the endpoints
	pub fn connects(&self, region: RegionID) -> bool {
		self.regions[0] == region || self.regions[1] == region
	}
	/// Get the endpoint across the portal from `region`. Panics if `region`
	/// is not an endpoint
	pub fn other_region(&self, region: RegionID) -> RegionID {
		if self.regions[0] == region {
			self.regions[1]
		} else if self.regions[1] == region {
			self.regions[0]
		} else {
			panic!("Region {:?} is not an endpoint of {:?}", region, self);
		}
	}
	/// The boundary of `region` this portal sits on, i.e. the direction of
	/// travel away from `region`. Panics if `region` is not an endpoint
	pub fn side_from(&self, region: RegionID) -> Side {
		if self.regions[0] == region {
			self.side
		} else if self.regions[1] == region {
			self.side.inverse()
		} else {
			panic!("Region {:?} is not an endpoint of {:?}", region, self);
		}
	}
	/// Whether both endpoints have collapsed onto the same region. Only ever
	/// true transiently inside a merge
	pub fn is_self_loop(&self) -> bool {
		self.regions[0] == self.regions[1]
	}
	/// Swap the endpoint `from` for `to`
	pub(crate) fn replace_region(&mut self, from: RegionID, to: RegionID) {
		if self.regions[0] == from {
			self.regions[0] = to;
		} else if self.regions[1] == from {
			self.regions[1] = to;
		} else {
			panic!("Region {:?} is not an endpoint of {:?}", from, self);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn other_region_of_either_endpoint() {
		let a = RegionID::new(0, 0);
		let b = RegionID::new(1, 0);
		let portal = Portal::new(5, Range::new(0, 3), Side::Right, a, b);
		assert_eq!(b, portal.other_region(a));
		assert_eq!(a, portal.other_region(b));
	}
	#[test]
	fn side_seen_from_each_endpoint() {
		let a = RegionID::new(0, 0);
		let b = RegionID::new(1, 0);
		let portal = Portal::new(5, Range::new(0, 3), Side::Right, a, b);
		assert_eq!(Side::Right, portal.side_from(a));
		assert_eq!(Side::Left, portal.side_from(b));
	}
	#[test]
	fn replace_creates_self_loop() {
		let a = RegionID::new(0, 0);
		let b = RegionID::new(1, 0);
		let mut portal = Portal::new(5, Range::new(0, 3), Side::Right, a, b);
		assert!(!portal.is_self_loop());
		portal.replace_region(b, a);
		assert!(portal.is_self_loop());
	}
}
