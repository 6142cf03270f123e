use super::error::LoadError;
use crate::core::models::asymmetric_unit::AsymmetricUnit;
use crate::core::models::cell::UnitCell;
use crate::core::models::crystal::{Crystal, CrystalError};
use crate::core::models::element;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk description of a crystal structure.
///
/// ```toml
/// title = "urea"
/// symmetry = ["x,y,z", "-x,-y,-z"]
///
/// [cell]
/// a = 5.58
/// b = 5.58
/// c = 4.69
/// alpha = 90.0
/// beta = 90.0
/// gamma = 90.0
///
/// [[atoms]]
/// label = "O1"
/// element = "O"
/// position = [0.0, 0.5, 0.596]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub cell: CellRecord,
    #[serde(default)]
    pub symmetry: Vec<String>,
    pub atoms: Vec<AtomRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    #[serde(default = "right_angle")]
    pub alpha: f64,
    #[serde(default = "right_angle")]
    pub beta: f64,
    #[serde(default = "right_angle")]
    pub gamma: f64,
}

fn right_angle() -> f64 {
    90.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub label: String,
    pub element: String,
    pub position: [f64; 3],
    /// Replaces the tabulated covalent radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covalent_radius: Option<f64>,
    /// Replaces the tabulated van der Waals radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdw_radius: Option<f64>,
}

impl CrystalFile {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Builds the crystal described by this file.
    pub fn to_crystal(&self) -> Result<Crystal, CrystalError> {
        let cell = UnitCell::new(
            self.cell.a,
            self.cell.b,
            self.cell.c,
            self.cell.alpha,
            self.cell.beta,
            self.cell.gamma,
        )?;

        let mut asym = AsymmetricUnit::new();
        for atom in &self.atoms {
            let [x, y, z] = atom.position;
            let idx = asym.add_atom_by_symbol(&atom.label, &atom.element, Vector3::new(x, y, z))?;
            if atom.covalent_radius.is_some() || atom.vdw_radius.is_some() {
                let covalent = atom.covalent_radius.unwrap_or(asym.covalent_radii()[idx]);
                let vdw = atom.vdw_radius.unwrap_or(asym.vdw_radii()[idx]);
                asym.set_radii(idx, covalent, vdw);
            }
        }

        Crystal::from_symops_str(asym, cell, &self.symmetry)
    }

    /// Describes an existing crystal; radii are written only where they differ from the table.
    pub fn from_crystal(crystal: &Crystal) -> Self {
        let cell = crystal.unit_cell();
        let angles = cell.angles();
        let asym = crystal.asymmetric_unit();

        let atoms = (0..asym.len())
            .map(|i| {
                let z = asym.atomic_numbers[i];
                let tabulated = element::by_atomic_number(z).ok();
                let p = asym.positions[i];
                AtomRecord {
                    label: asym.labels[i].clone(),
                    element: tabulated.map_or_else(|| z.to_string(), |e| e.symbol.to_string()),
                    position: [p.x, p.y, p.z],
                    covalent_radius: Some(asym.covalent_radii()[i])
                        .filter(|r| tabulated.is_none_or(|e| e.covalent_radius != *r)),
                    vdw_radius: Some(asym.vdw_radii()[i])
                        .filter(|r| tabulated.is_none_or(|e| e.vdw_radius != *r)),
                }
            })
            .collect();

        Self {
            title: None,
            cell: CellRecord {
                a: cell.a(),
                b: cell.b(),
                c: cell.c(),
                alpha: angles.x,
                beta: angles.y,
                gamma: angles.z,
            },
            symmetry: crystal
                .symmetry_operations()
                .iter()
                .map(|op| op.to_string())
                .collect(),
            atoms,
        }
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn read_crystal_file(path: &Path) -> Result<CrystalFile, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: display_path(path),
        source: e,
    })?;
    CrystalFile::from_toml_str(&content).map_err(|e| LoadError::Toml {
        path: display_path(path),
        source: e,
    })
}

pub fn load_crystal(path: &Path) -> Result<Crystal, LoadError> {
    let file = read_crystal_file(path)?;
    let crystal = file.to_crystal().map_err(|e| LoadError::Crystal {
        path: display_path(path),
        source: e,
    })?;
    info!(
        path = %path.display(),
        title = file.title.as_deref().unwrap_or(""),
        asymmetric_atoms = crystal.asymmetric_unit().len(),
        unit_cell_atoms = crystal.unit_cell_atoms().len(),
        "Loaded crystal."
    );
    Ok(crystal)
}

pub fn save_crystal(path: &Path, crystal: &Crystal) -> Result<(), LoadError> {
    let content = CrystalFile::from_crystal(crystal)
        .to_toml_string()
        .map_err(|e| LoadError::Io {
            path: display_path(path),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
    std::fs::write(path, content).map_err(|e| LoadError::Io {
        path: display_path(path),
        source: e,
    })
}
