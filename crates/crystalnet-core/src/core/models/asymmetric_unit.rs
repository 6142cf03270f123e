use super::element::{self, ElementError};
use nalgebra::Vector3;

/// The symmetry-independent atoms of a crystal, in fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetricUnit {
    pub labels: Vec<String>,
    pub atomic_numbers: Vec<u8>,
    pub positions: Vec<Vector3<f64>>,
    covalent_radii: Vec<f64>,
    vdw_radii: Vec<f64>,
}

impl AsymmetricUnit {
    pub fn new() -> Self {
        Self {
            labels: Vec::new(),
            atomic_numbers: Vec::new(),
            positions: Vec::new(),
            covalent_radii: Vec::new(),
            vdw_radii: Vec::new(),
        }
    }

    /// Appends an atom, resolving its radii from the element table.
    pub fn add_atom(
        &mut self,
        label: &str,
        atomic_number: u8,
        position: Vector3<f64>,
    ) -> Result<usize, ElementError> {
        let data = element::by_atomic_number(atomic_number)?;
        self.labels.push(label.to_string());
        self.atomic_numbers.push(atomic_number);
        self.positions.push(position);
        self.covalent_radii.push(data.covalent_radius);
        self.vdw_radii.push(data.vdw_radius);
        Ok(self.labels.len() - 1)
    }

    pub fn add_atom_by_symbol(
        &mut self,
        label: &str,
        symbol: &str,
        position: Vector3<f64>,
    ) -> Result<usize, ElementError> {
        let data = element::by_symbol(symbol)?;
        self.add_atom(label, data.atomic_number, position)
    }

    /// Replaces the tabulated radii of one atom (e.g. for ionic species).
    pub fn set_radii(&mut self, idx: usize, covalent: f64, vdw: f64) {
        self.covalent_radii[idx] = covalent;
        self.vdw_radii[idx] = vdw;
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn covalent_radii(&self) -> &[f64] {
        &self.covalent_radii
    }

    pub fn vdw_radii(&self) -> &[f64] {
        &self.vdw_radii
    }

    pub fn max_vdw_radius(&self) -> f64 {
        self.vdw_radii.iter().copied().fold(0.0, f64::max)
    }

    pub fn max_covalent_radius(&self) -> f64 {
        self.covalent_radii.iter().copied().fold(0.0, f64::max)
    }
}

impl Default for AsymmetricUnit {
    fn default() -> Self {
        Self::new()
    }
}
