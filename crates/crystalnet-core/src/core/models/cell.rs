use super::hkl::HKL;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CellError {
    #[error("Cell length '{name}' must be positive, got {value}")]
    NonPositiveLength { name: &'static str, value: f64 },
    #[error("Cell angle '{name}' must lie strictly between 0 and 180 degrees, got {value}")]
    InvalidAngle { name: &'static str, value: f64 },
    #[error("Cell parameters describe a degenerate cell (volume {volume:.6})")]
    Degenerate { volume: f64 },
}

/// The periodic parallelepiped of a crystal.
///
/// Lattice vectors are stored as the columns of the direct matrix in the
/// standard orientation: `a` along x, `b` in the xy-plane.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    lengths: Vector3<f64>,
    angles: Vector3<f64>,
    direct: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl UnitCell {
    /// Builds a cell from lengths in Angstroms and angles in degrees.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, CellError> {
        for (name, value) in [("a", a), ("b", b), ("c", c)] {
            if !(value > 0.0) {
                return Err(CellError::NonPositiveLength { name, value });
            }
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(value > 0.0 && value < 180.0) {
                return Err(CellError::InvalidAngle { name, value });
            }
        }

        let (ca, cb, cg) = (
            alpha.to_radians().cos(),
            beta.to_radians().cos(),
            gamma.to_radians().cos(),
        );
        let sg = gamma.to_radians().sin();

        let cy = (ca - cb * cg) / sg;
        let cz_sq = 1.0 - cb * cb - cy * cy;
        if cz_sq <= 0.0 {
            return Err(CellError::Degenerate { volume: 0.0 });
        }

        #[rustfmt::skip]
        let direct = Matrix3::new(
            a,   b * cg, c * cb,
            0.0, b * sg, c * cy,
            0.0, 0.0,    c * cz_sq.sqrt(),
        );

        let volume = direct.determinant();
        let inverse = match direct.try_inverse() {
            Some(inv) if volume > 1e-8 => inv,
            _ => return Err(CellError::Degenerate { volume }),
        };

        Ok(Self {
            lengths: Vector3::new(a, b, c),
            angles: Vector3::new(alpha, beta, gamma),
            direct,
            inverse,
        })
    }

    pub fn cubic(a: f64) -> Result<Self, CellError> {
        Self::new(a, a, a, 90.0, 90.0, 90.0)
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, CellError> {
        Self::new(a, b, c, 90.0, 90.0, 90.0)
    }

    pub fn a(&self) -> f64 {
        self.lengths.x
    }

    pub fn b(&self) -> f64 {
        self.lengths.y
    }

    pub fn c(&self) -> f64 {
        self.lengths.z
    }

    /// Cell angles (alpha, beta, gamma) in degrees.
    pub fn angles(&self) -> Vector3<f64> {
        self.angles
    }

    pub fn direct(&self) -> &Matrix3<f64> {
        &self.direct
    }

    pub fn volume(&self) -> f64 {
        self.direct.determinant()
    }

    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.direct * frac)
    }

    pub fn to_fractional(&self, cart: &Point3<f64>) -> Vector3<f64> {
        self.inverse * cart.coords
    }

    /// Cartesian displacement produced by a lattice translation.
    pub fn translation(&self, hkl: HKL) -> Vector3<f64> {
        self.direct * hkl.to_vector()
    }

    /// Converts a fractional displacement (not a position) into Cartesian space.
    pub fn displacement_to_cartesian(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.direct * frac
    }

    /// Perpendicular distances between adjacent (100), (010) and (001) lattice planes.
    pub fn plane_spacings(&self) -> Vector3<f64> {
        let a = self.direct.column(0).into_owned();
        let b = self.direct.column(1).into_owned();
        let c = self.direct.column(2).into_owned();
        let v = self.volume();
        Vector3::new(
            v / b.cross(&c).norm(),
            v / c.cross(&a).norm(),
            v / a.cross(&b).norm(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn cubic_cell_has_diagonal_direct_matrix() {
        let cell = UnitCell::cubic(5.0).unwrap();
        assert!((cell.direct() - Matrix3::from_diagonal_element(5.0)).norm() < EPS);
        assert!((cell.volume() - 125.0).abs() < EPS);
    }

    #[test]
    fn fractional_cartesian_round_trip_in_triclinic_cell() {
        let cell = UnitCell::new(5.1, 6.3, 7.7, 81.0, 95.5, 103.2).unwrap();
        let frac = Vector3::new(0.13, -0.42, 1.7);
        let back = cell.to_fractional(&cell.to_cartesian(&frac));
        assert!((back - frac).norm() < 1e-12);
    }

    #[test]
    fn lattice_vector_lengths_match_parameters() {
        let cell = UnitCell::new(4.0, 5.0, 6.0, 70.0, 80.0, 100.0).unwrap();
        let m = cell.direct();
        assert!((m.column(0).norm() - 4.0).abs() < EPS);
        assert!((m.column(1).norm() - 5.0).abs() < EPS);
        assert!((m.column(2).norm() - 6.0).abs() < EPS);
        let cos_gamma = m.column(0).dot(&m.column(1)) / 20.0;
        assert!((cos_gamma - 100.0f64.to_radians().cos()).abs() < EPS);
    }

    #[test]
    fn translation_matches_lattice_vectors() {
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        let t = cell.translation(HKL::new(1, -1, 2));
        assert!((t - Vector3::new(3.0, -4.0, 10.0)).norm() < EPS);
    }

    #[test]
    fn plane_spacings_of_orthorhombic_cell_equal_lengths() {
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        assert!((cell.plane_spacings() - Vector3::new(3.0, 4.0, 5.0)).norm() < EPS);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            UnitCell::cubic(0.0),
            Err(CellError::NonPositiveLength { name: "a", .. })
        ));
        assert!(matches!(
            UnitCell::new(1.0, 1.0, 1.0, 90.0, 180.0, 90.0),
            Err(CellError::InvalidAngle { name: "beta", .. })
        ));
        assert!(matches!(
            UnitCell::new(1.0, 1.0, 1.0, 10.0, 100.0, 10.0),
            Err(CellError::Degenerate { .. })
        ));
    }
}
