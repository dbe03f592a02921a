//! This is a plugin for Bevy game engine to maintain a decomposition of a grid into rectangular regions joined by portals and to find paths over the resulting graph as obstacles come and go
//!

pub mod regions;
pub mod bundle;
pub mod plugin;

pub mod prelude;
