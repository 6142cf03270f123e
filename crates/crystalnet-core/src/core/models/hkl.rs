use nalgebra::Vector3;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// An integer lattice translation identifying a periodic image of the unit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HKL {
    pub h: i32,
    pub k: i32,
    pub l: i32,
}

impl HKL {
    pub const ZERO: HKL = HKL { h: 0, k: 0, l: 0 };

    pub const fn new(h: i32, k: i32, l: i32) -> Self {
        Self { h, k, l }
    }

    /// Rounds each fractional component to the nearest integer translation.
    pub fn round(v: &Vector3<f64>) -> Self {
        Self::new(v.x.round() as i32, v.y.round() as i32, v.z.round() as i32)
    }

    /// The cell containing a fractional point, i.e. `floor` of every component.
    pub fn floor(v: &Vector3<f64>) -> Self {
        Self::new(v.x.floor() as i32, v.y.floor() as i32, v.z.floor() as i32)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// True if the first non-zero component is positive.
    ///
    /// Exactly one of `t` and `-t` is positive for every non-zero `t`, which is
    /// what the connectivity builder relies on to pair an atom with its own
    /// periodic images only once.
    pub fn is_positive(&self) -> bool {
        *self > Self::ZERO
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.h as f64, self.k as f64, self.l as f64)
    }
}

impl Add for HKL {
    type Output = HKL;
    fn add(self, rhs: HKL) -> HKL {
        HKL::new(self.h + rhs.h, self.k + rhs.k, self.l + rhs.l)
    }
}

impl AddAssign for HKL {
    fn add_assign(&mut self, rhs: HKL) {
        *self = *self + rhs;
    }
}

impl Sub for HKL {
    type Output = HKL;
    fn sub(self, rhs: HKL) -> HKL {
        HKL::new(self.h - rhs.h, self.k - rhs.k, self.l - rhs.l)
    }
}

impl SubAssign for HKL {
    fn sub_assign(&mut self, rhs: HKL) {
        *self = *self - rhs;
    }
}

impl Neg for HKL {
    type Output = HKL;
    fn neg(self) -> HKL {
        HKL::new(-self.h, -self.k, -self.l)
    }
}

impl From<[i32; 3]> for HKL {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for HKL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.h, self.k, self.l)
    }
}

/// A specific periodic image of a specific reference entry (atom or molecule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteIndex {
    /// Index into the reference list (unit-cell atoms or unit-cell molecules).
    pub offset: usize,
    pub hkl: HKL,
}

impl SiteIndex {
    pub const fn new(offset: usize, hkl: HKL) -> Self {
        Self { offset, hkl }
    }

    pub fn translated(&self, shift: HKL) -> Self {
        Self::new(self.offset, self.hkl + shift)
    }
}

impl fmt::Display for SiteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.offset, self.hkl)
    }
}

/// Ordered pair of sites describing a dimer and the relative offset of its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimerIndex {
    pub a: SiteIndex,
    pub b: SiteIndex,
}

impl DimerIndex {
    pub const fn new(a: SiteIndex, b: SiteIndex) -> Self {
        Self { a, b }
    }

    pub fn hkl_difference(&self) -> HKL {
        self.b.hkl - self.a.hkl
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.b, self.a)
    }

    pub fn translated(&self, shift: HKL) -> Self {
        Self::new(self.a.translated(shift), self.b.translated(shift))
    }
}

// Lexicographic on (a.offset, b.offset, a.hkl, b.hkl); the field order of the
// struct would give (a.offset, a.hkl, ...) under a derive.
impl Ord for DimerIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.a
            .offset
            .cmp(&other.a.offset)
            .then_with(|| self.b.offset.cmp(&other.b.offset))
            .then_with(|| self.a.hkl.cmp(&other.a.hkl))
            .then_with(|| self.b.hkl.cmp(&other.b.hkl))
    }
}

impl PartialOrd for DimerIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DimerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}
