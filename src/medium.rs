//! Electromagnetic media and the refractive index used to size grid steps

use std::f64::consts::PI;

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

/// Speed of light in vacuum (µm/s)
pub const C_0: f64 = 2.997_924_58e14;
/// Permittivity of free space (F/m)
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;

/// Linear, non-dispersive medium.
///
/// A known `name` (see [`Medium::from_name`]) takes precedence over the numeric
/// fields, mirroring how scene files usually refer to stock materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medium {
    pub name: Option<String>,
    /// Relative permittivity (epsilon_r)
    pub permittivity: f64,
    /// Relative permeability (mu_r)
    pub permeability: f64,
    /// Electric conductivity (S/m)
    pub conductivity: f64,
    /// Perfect electric conductor
    pub pec: bool,
}

impl Default for Medium {
    fn default() -> Self {
        Self {
            name: None,
            permittivity: 1.0,
            permeability: 1.0,
            conductivity: 0.0,
            pec: false,
        }
    }
}

impl Medium {
    pub fn air() -> Self {
        Self {
            name: Some("air".to_string()),
            ..Self::default()
        }
    }

    pub fn pec() -> Self {
        Self {
            name: Some("pec".to_string()),
            pec: true,
            ..Self::default()
        }
    }

    /// Copper (σ = 5.8×10⁷ S/m)
    pub fn copper() -> Self {
        Self {
            name: Some("copper".to_string()),
            conductivity: 5.8e7,
            ..Self::default()
        }
    }

    pub fn fr4() -> Self {
        Self::named("fr4", 4.4)
    }

    pub fn silicon() -> Self {
        Self::named("silicon", 12.25)
    }

    pub fn silica() -> Self {
        Self::named("silica", 2.085)
    }

    /// Lossless dielectric with the given permittivity
    pub fn dielectric(permittivity: f64) -> Self {
        Self {
            permittivity,
            ..Self::default()
        }
    }

    fn named(name: &str, permittivity: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            permittivity,
            ..Self::default()
        }
    }

    /// Stock medium for `name`, if it is one
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "air" | "vacuum" => Some(Self::air()),
            "pec" | "metal" => Some(Self::pec()),
            "copper" | "cu" => Some(Self::copper()),
            "fr4" => Some(Self::fr4()),
            "silicon" | "si" => Some(Self::silicon()),
            "silica" | "sio2" => Some(Self::silica()),
            _ => None,
        }
    }

    fn resolved(&self) -> Self {
        self.name
            .as_deref()
            .and_then(Self::from_name)
            .unwrap_or_else(|| self.clone())
    }

    /// Complex relative permittivity at the given free-space wavelength (µm)
    pub fn eps_complex(&self, wavelength: f64) -> Complex<f64> {
        let m = self.resolved();
        let omega = 2.0 * PI * C_0 / wavelength;
        Complex::new(m.permittivity, -m.conductivity / (omega * EPSILON_0))
    }

    /// Index used to size grid steps: `max(|n|, |k|)` of `sqrt(eps * mu)`.
    /// A PEC has no field inside, so it does not refine the grid.
    pub fn refractive_index(&self, wavelength: f64) -> f64 {
        let m = self.resolved();
        if m.pec {
            return 1.0;
        }
        let nk = (self.eps_complex(wavelength) * m.permeability).sqrt();
        nk.re.abs().max(nk.im.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossless_index() {
        let si = Medium::silicon();
        assert!((si.refractive_index(1.55) - 3.5).abs() < 1e-12);
        assert!((Medium::air().refractive_index(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pec_does_not_refine() {
        assert_eq!(Medium::pec().refractive_index(0.5), 1.0);
    }

    #[test]
    fn test_conductor_index_is_large() {
        // At 1 GHz (λ = 3e5 µm) copper's loss term dominates
        let n = Medium::copper().refractive_index(2.997_924_58e5);
        assert!(n > 1e3, "copper index {n} should be dominated by k");
    }

    #[test]
    fn test_name_overrides_fields() {
        let m = Medium {
            name: Some("FR4".to_string()),
            permittivity: 1.0,
            ..Medium::default()
        };
        assert!((m.refractive_index(1.0) - 4.4f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_stock_names() {
        assert!(Medium::from_name("Si").is_some());
        assert!(Medium::from_name("unobtainium").is_none());
    }
}
