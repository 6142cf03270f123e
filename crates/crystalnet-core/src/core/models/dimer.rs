use super::molecule::Molecule;
use crate::core::utils::geometry;

/// A pair of molecules considered together for interaction purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimer {
    a: Molecule,
    b: Molecule,
    nearest_distance: f64,
}

impl Dimer {
    pub fn new(a: Molecule, b: Molecule) -> Self {
        let nearest_distance = geometry::closest_distance_sq(&a.positions, &b.positions).sqrt();
        Self {
            a,
            b,
            nearest_distance,
        }
    }

    pub fn a(&self) -> &Molecule {
        &self.a
    }

    pub fn b(&self) -> &Molecule {
        &self.b
    }

    /// Shortest interatomic distance between the two molecules.
    pub fn nearest_distance(&self) -> f64 {
        self.nearest_distance
    }

    pub fn centroid_distance(&self) -> f64 {
        (self.b.centroid() - self.a.centroid()).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::UnitCell;
    use crate::core::models::hkl::HKL;
    use nalgebra::Point3;

    #[test]
    fn distances_are_computed_between_members() {
        let cell = UnitCell::cubic(5.0).unwrap();
        let m = Molecule::new(
            vec![0, 1],
            vec![HKL::ZERO; 2],
            vec![0, 1],
            vec![1, 1],
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.8, 0.0, 0.0)],
            0,
        );
        let dimer = Dimer::new(m.clone(), m.translated(&cell, HKL::new(1, 0, 0)));
        assert!((dimer.nearest_distance() - 4.2).abs() < 1e-12);
        assert!((dimer.centroid_distance() - 5.0).abs() < 1e-12);
        assert_eq!(dimer.b().cell_shift, HKL::new(1, 0, 0));
    }
}
