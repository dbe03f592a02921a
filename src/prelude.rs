//! `use bevy_region_graph_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::regions::{geometry::*, graph::*, pathfind::*, portal::*, region::*, search::*, *};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{obstacle_layer::*, route_layer::*, *},
};
