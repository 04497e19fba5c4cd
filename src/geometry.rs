//! Axis-aligned geometry consumed by the mesher.
//!
//! The grid generator only needs bounding boxes, so every structure is
//! reduced to a `center`/`size` box plus the information that decides the
//! step size inside it.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::medium::Medium;

/// One of the three simulation axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reflection symmetry eigenvalue along one axis: -1, 0 (none) or +1
pub type Symmetry = i8;

/// A point the grid must pass through. `None` components leave that axis free.
pub type SnapPoint = [Option<f64>; 3];

/// Axis-aligned box given by its center and full size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub center: Vector3<f64>,
    pub size: Vector3<f64>,
}

impl BoxGeometry {
    pub fn new(center: [f64; 3], size: [f64; 3]) -> Self {
        Self {
            center: Vector3::from(center),
            size: Vector3::from(size),
        }
    }

    /// Box spanning the two corners
    pub fn from_bounds(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self {
            center: (min + max) / 2.0,
            size: max - min,
        }
    }

    /// Minimum and maximum corners
    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let half = self.size / 2.0;
        (self.center - half, self.center + half)
    }

    /// Extent along one axis
    pub fn axis_bounds(&self, axis: Axis) -> (f64, f64) {
        let i = axis.index();
        let half = self.size[i] / 2.0;
        (self.center[i] - half, self.center[i] + half)
    }

    /// True if the boxes touch or overlap in every dimension
    pub fn intersects(&self, other: &BoxGeometry) -> bool {
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = other.bounds();
        (0..3).all(|i| a_min[i] <= b_max[i] && b_min[i] <= a_max[i])
    }

    /// True if `other` lies entirely inside this box
    pub fn contains(&self, other: &BoxGeometry) -> bool {
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = other.bounds();
        (0..3).all(|i| a_min[i] <= b_min[i] && b_max[i] <= a_max[i])
    }

    /// Intersection with `domain`, or `None` if they are disjoint
    pub fn clipped_to(&self, domain: &BoxGeometry) -> Option<BoxGeometry> {
        if !self.intersects(domain) {
            return None;
        }
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = domain.bounds();
        Some(BoxGeometry::from_bounds(a_min.sup(&b_min), a_max.inf(&b_max)))
    }
}

/// What decides the grid step inside a structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Step follows from the wavelength inside the medium
    Medium { medium: Medium },
    /// Mesh override box with an explicit step per axis. `None` leaves the
    /// axis to the other structures. An `enforced` override wins over any
    /// other structure it overlaps.
    Override {
        dl: [Option<f64>; 3],
        #[serde(default)]
        enforced: bool,
    },
}

/// A box taking part in grid generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default)]
    pub name: String,
    pub geometry: BoxGeometry,
    pub resolution: Resolution,
}

impl Structure {
    pub fn new(name: impl Into<String>, geometry: BoxGeometry, medium: Medium) -> Self {
        Self {
            name: name.into(),
            geometry,
            resolution: Resolution::Medium { medium },
        }
    }

    pub fn mesh_override(
        name: impl Into<String>,
        geometry: BoxGeometry,
        dl: [Option<f64>; 3],
        enforced: bool,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            resolution: Resolution::Override { dl, enforced },
        }
    }

    pub fn medium(&self) -> Option<&Medium> {
        match &self.resolution {
            Resolution::Medium { medium } => Some(medium),
            Resolution::Override { .. } => None,
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self.resolution, Resolution::Override { enforced: true, .. })
    }

    /// Whether this structure has any say in the step along `axis`
    pub fn acts_on(&self, axis: Axis) -> bool {
        match &self.resolution {
            Resolution::Medium { .. } => true,
            Resolution::Override { dl, .. } => dl[axis.index()].is_some(),
        }
    }

    /// Largest step allowed inside this structure along `axis`
    pub fn max_step(&self, axis: Axis, wavelength: f64, min_steps_per_wvl: f64) -> Option<f64> {
        match &self.resolution {
            Resolution::Medium { medium } => {
                Some(wavelength / min_steps_per_wvl / medium.refractive_index(wavelength))
            }
            Resolution::Override { dl, .. } => dl[axis.index()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_bounds() {
        let b = BoxGeometry::new([1.0, 0.0, -1.0], [2.0, 4.0, 0.0]);
        assert_eq!(b.axis_bounds(Axis::X), (0.0, 2.0));
        assert_eq!(b.axis_bounds(Axis::Y), (-2.0, 2.0));
        assert_eq!(b.axis_bounds(Axis::Z), (-1.0, -1.0));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = BoxGeometry::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = BoxGeometry::new([2.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let c = BoxGeometry::new([3.5, 0.0, 0.0], [1.0, 2.0, 2.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_clip_to_domain() {
        let domain = BoxGeometry::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let slab = BoxGeometry::new([0.5, 0.0, 0.0], [3.0, 10.0, 0.5]);
        let clipped = slab.clipped_to(&domain).unwrap();
        assert_eq!(clipped.axis_bounds(Axis::X), (-1.0, 1.0));
        assert_eq!(clipped.axis_bounds(Axis::Y), (-1.0, 1.0));
        assert_eq!(clipped.axis_bounds(Axis::Z), (-0.25, 0.25));
        assert!(domain.contains(&clipped));
    }

    #[test]
    fn test_override_step_only_on_given_axes() {
        let s = Structure::mesh_override(
            "refine",
            BoxGeometry::new([0.0; 3], [1.0; 3]),
            [Some(0.01), None, Some(0.02)],
            false,
        );
        assert!(s.acts_on(Axis::X));
        assert!(!s.acts_on(Axis::Y));
        assert_eq!(s.max_step(Axis::X, 1.0, 10.0), Some(0.01));
        assert_eq!(s.max_step(Axis::Y, 1.0, 10.0), None);
    }

    #[test]
    fn test_medium_step_scales_with_index() {
        let s = Structure::new(
            "slab",
            BoxGeometry::new([0.0; 3], [1.0; 3]),
            Medium::dielectric(4.0),
        );
        let dl = s.max_step(Axis::Z, 1.5, 10.0).unwrap();
        assert!((dl - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_parse_structure() {
        let json = r#"{
            "name": "wg",
            "geometry": {"center": [0.0, 0.0, 0.0], "size": [1.0, 0.5, 0.22]},
            "resolution": {"kind": "medium", "medium": {"name": "silicon"}}
        }"#;
        let s: Structure = serde_json::from_str(json).unwrap();
        assert_eq!(s.name, "wg");
        assert!(s.medium().is_some());
        assert!((s.geometry.size.z - 0.22).abs() < 1e-12);
    }
}
