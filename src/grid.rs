//! Generated cell boundaries

use serde::{Deserialize, Serialize};

use crate::geometry::Axis;

/// Cell boundaries along one axis, strictly increasing, at least two entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct Coords1D(Vec<f64>);

impl TryFrom<Vec<f64>> for Coords1D {
    type Error = String;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        if coords.len() < 2 {
            return Err(format!("need at least 2 boundaries, got {}", coords.len()));
        }
        if !coords.windows(2).all(|w| w[0] < w[1]) {
            return Err("boundaries must be strictly increasing".to_string());
        }
        Ok(Self(coords))
    }
}

impl From<Coords1D> for Vec<f64> {
    fn from(coords: Coords1D) -> Self {
        coords.0
    }
}

impl Coords1D {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num_cells(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Cell sizes
    pub fn steps(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Cell centers
    pub fn centers(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    pub fn min_step(&self) -> f64 {
        self.steps().into_iter().fold(f64::INFINITY, f64::min)
    }

    pub fn max_step(&self) -> f64 {
        self.steps().into_iter().fold(0.0, f64::max)
    }

    /// Largest ratio between neighbouring cells (always >= 1)
    pub fn max_step_ratio(&self) -> f64 {
        self.steps()
            .windows(2)
            .map(|w| (w[1] / w[0]).max(w[0] / w[1]))
            .fold(1.0, f64::max)
    }
}

/// Boundaries along all three axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub x: Coords1D,
    pub y: Coords1D,
    pub z: Coords1D,
}

impl Grid {
    pub fn axis(&self, axis: Axis) -> &Coords1D {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Cell counts along x, y, z
    pub fn num_cells(&self) -> [usize; 3] {
        [self.x.num_cells(), self.y.num_cells(), self.z.num_cells()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_and_ratio() {
        let c = Coords1D::try_from(vec![0.0, 1.0, 3.0, 4.0]).unwrap();
        assert_eq!(c.steps(), vec![1.0, 2.0, 1.0]);
        assert_eq!(c.centers(), vec![0.5, 2.0, 3.5]);
        assert_eq!(c.max_step_ratio(), 2.0);
        assert_eq!(c.min_step(), 1.0);
        assert_eq!(c.max_step(), 2.0);
        assert_eq!(c.num_cells(), 3);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let grid = Grid {
            x: Coords1D::try_from(vec![0.0, 1.0]).unwrap(),
            y: Coords1D::try_from(vec![-1.0, 0.0, 1.0]).unwrap(),
            z: Coords1D::try_from(vec![0.0, 0.5]).unwrap(),
        };
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"{"x":[0.0,1.0],"y":[-1.0,0.0,1.0],"z":[0.0,0.5]}"#);
        assert_eq!(grid.num_cells(), [1, 2, 1]);

        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_rejects_unsorted_boundaries() {
        assert!(Coords1D::try_from(vec![0.0, 2.0, 1.0]).is_err());
        assert!(Coords1D::try_from(vec![0.0]).is_err());
        assert!(serde_json::from_str::<Coords1D>("[0.0, 0.0]").is_err());
    }
}
