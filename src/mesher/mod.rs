//! Non-uniform meshing along a single axis.
//!
//! [`interval`] turns structures into intervals with a step ceiling and
//! splits them at mandatory coordinates; [`graded`] fills every interval
//! with cells whose size changes smoothly across the whole axis.

pub mod graded;
pub mod interval;

pub use graded::make_grid_multiple_intervals;
pub use interval::{
    insert_snapping_points, mandatory_coords, parse_structures, IntervalSet, OverlapPolicy,
};
