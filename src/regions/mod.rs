//! A grid is decomposed into a set of axis-aligned rectangular Regions
//! separated by Portals, a shared boundary segment between two adjacent
//! Regions. Together they form a graph which tiles the grid exactly: every
//! cell belongs to precisely one Region and every boundary between two
//! Regions is covered by one or more Portals.
//!
//! ```text
//!  _______________________________
//! |               |               |
//! |               P               |
//! |    Normal     P    Normal     |
//! |_______________|_____ _________|
//! |       | x x x x x x |         |
//! |       P x x Block x P         |
//! |       | x x x x x x |         |
//! |_______|_____________|_________|
//! |               |               |
//! |    Normal     P    Normal     |
//! |_______________|_______________|
//! ```
//!
//! Obstacles are inserted as rectangles. Each Region overlapping the
//! obstacle is split around the overlap, portals along the vanished sides
//! are re-homed onto the leftover sub-regions, and same-type neighbours are
//! merged back together so free space stays coarse. Pathfinding then walks
//! the Region/Portal graph one Region at a time, so its cost scales with the
//! number of portals rather than the number of grid cells
//!

pub mod geometry;
pub mod graph;
pub mod pathfind;
pub mod portal;
pub mod region;
pub mod search;
