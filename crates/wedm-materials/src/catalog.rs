use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wedm_core::constants::ROOM_TEMPERATURE_K;

use crate::error::{MaterialError, MaterialResult};

/// Thermal and electrical properties of a wire electrode material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMaterial {
    /// [kg/m³]
    pub density: f64,
    /// [J/(kg·K)]
    pub specific_heat: f64,
    /// [W/(m·K)]
    pub thermal_conductivity: f64,
    /// [Ω·m] at room temperature
    pub electrical_resistivity: f64,
    /// Linear resistivity coefficient [1/K]
    pub temperature_coefficient: f64,
    /// [K]
    pub melting_point: f64,
    /// Temperature at which the wire parts [K]
    pub breaking_temperature: f64,
}

impl WireMaterial {
    /// Volumetric heat capacity `ρ·c` [J/(m³·K)].
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.specific_heat
    }

    /// Resistivity at temperature `t` [K], linear around room temperature.
    pub fn resistivity_at(&self, t: f64) -> f64 {
        self.electrical_resistivity * (1.0 + self.temperature_coefficient * (t - ROOM_TEMPERATURE_K))
    }

    fn check(&self, name: &str) -> MaterialResult<()> {
        let positive = [
            ("density", self.density),
            ("specific_heat", self.specific_heat),
            ("thermal_conductivity", self.thermal_conductivity),
            ("electrical_resistivity", self.electrical_resistivity),
            ("melting_point", self.melting_point),
            ("breaking_temperature", self.breaking_temperature),
        ];
        for (what, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MaterialError::InvalidProperty {
                    name: name.to_string(),
                    what,
                    value,
                });
            }
        }
        if !self.temperature_coefficient.is_finite() {
            return Err(MaterialError::InvalidProperty {
                name: name.to_string(),
                what: "temperature_coefficient",
                value: self.temperature_coefficient,
            });
        }
        Ok(())
    }
}

/// Built-in material table.
pub const BUILTIN_MATERIALS: [(&str, WireMaterial); 1] = [(
    "brass",
    WireMaterial {
        density: 8400.0,
        specific_heat: 377.0,
        thermal_conductivity: 120.0,
        electrical_resistivity: 6.4e-8,
        temperature_coefficient: 0.0039,
        melting_point: 1173.0,
        breaking_temperature: 1500.0,
    },
)];

/// Read-only lookup of wire materials by name.
///
/// Build it once (built-ins, or a JSON file) and share it by reference;
/// nothing mutates it during a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDatabase {
    materials: BTreeMap<String, WireMaterial>,
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MaterialDatabase {
    pub fn builtin() -> Self {
        let materials = BUILTIN_MATERIALS
            .iter()
            .map(|(name, mat)| (name.to_string(), mat.clone()))
            .collect();
        Self { materials }
    }

    /// Look up a material by exact name.
    pub fn get(&self, name: &str) -> MaterialResult<&WireMaterial> {
        self.materials
            .get(name)
            .ok_or_else(|| MaterialError::NotFound {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireMaterial)> {
        self.materials.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add or replace a material after checking its properties.
    pub fn insert(&mut self, name: impl Into<String>, material: WireMaterial) -> MaterialResult<()> {
        let name = name.into();
        material.check(&name)?;
        self.materials.insert(name, material);
        Ok(())
    }

    /// Parse a JSON object of materials. Entries override built-ins of the same name.
    pub fn from_json_str(json: &str) -> MaterialResult<Self> {
        let parsed: BTreeMap<String, WireMaterial> = serde_json::from_str(json)?;
        let mut db = Self::builtin();
        for (name, material) in parsed {
            db.insert(name, material)?;
        }
        Ok(db)
    }

    pub fn to_json_string(&self) -> MaterialResult<String> {
        Ok(serde_json::to_string_pretty(&self.materials)?)
    }

    pub fn load_json(path: &Path) -> MaterialResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save_json(&self, path: &Path) -> MaterialResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
