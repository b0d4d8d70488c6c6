use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Unit in which raw angle arguments are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Keyword accepted in constructor argument lists.
    pub fn keyword(self) -> &'static str {
        match self {
            AngleUnit::Radians => "rad",
            AngleUnit::Degrees => "deg",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "rad" => Some(AngleUnit::Radians),
            "deg" => Some(AngleUnit::Degrees),
            _ => None,
        }
    }

    /// Multiplier that converts an angle in this unit to radians.
    pub fn radians_per_unit(self) -> f64 {
        match self {
            AngleUnit::Radians => 1.0,
            AngleUnit::Degrees => PI / 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgebraConfig {
    /// Unit used when an argument list carries no `"rad"`/`"deg"` keyword.
    pub angle_unit: AngleUnit,
    /// Multiple of machine epsilon allowed by the strict rotation predicate.
    pub tolerance_factor: f64,
    /// Check raw rotation blocks for orthonormality during resolution.
    pub strict_rotations: bool,
}

impl Default for AlgebraConfig {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Radians,
            tolerance_factor: 10.0,
            strict_rotations: true,
        }
    }
}

impl AlgebraConfig {
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded algebra config");
        Ok(config)
    }

    /// Absolute tolerance `k·ε` used by the strict predicates.
    pub fn tolerance(&self) -> f64 {
        self.tolerance_factor * f64::EPSILON
    }
}
