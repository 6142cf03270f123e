use phf::phf_map;
use thiserror::Error;

/// Per-element data used for bond and contact perception.
///
/// Covalent radii follow the CSD convention (hydrogen 0.23 Å, used together
/// with a 0.4 Å bonding tolerance); van der Waals radii are Bondi's, with
/// the Rowland–Taylor value for hydrogen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    pub atomic_number: u8,
    pub covalent_radius: f64,
    pub vdw_radius: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementError {
    #[error("Unknown element symbol '{0}'")]
    UnknownSymbol(String),
    #[error("Unknown atomic number {0}")]
    UnknownAtomicNumber(u8),
}

macro_rules! element {
    ($sym:literal, $z:literal, $cov:literal, $vdw:literal) => {
        ElementData {
            symbol: $sym,
            atomic_number: $z,
            covalent_radius: $cov,
            vdw_radius: $vdw,
        }
    };
}

static ELEMENTS: phf::Map<&'static str, ElementData> = phf_map! {
    "H" => element!("H", 1, 0.23, 1.09),
    "He" => element!("He", 2, 1.50, 1.40),
    "Li" => element!("Li", 3, 1.28, 1.82),
    "Be" => element!("Be", 4, 0.96, 1.53),
    "B" => element!("B", 5, 0.83, 1.92),
    "C" => element!("C", 6, 0.68, 1.70),
    "N" => element!("N", 7, 0.68, 1.55),
    "O" => element!("O", 8, 0.68, 1.52),
    "F" => element!("F", 9, 0.64, 1.47),
    "Ne" => element!("Ne", 10, 1.50, 1.54),
    "Na" => element!("Na", 11, 1.66, 2.27),
    "Mg" => element!("Mg", 12, 1.41, 1.73),
    "Al" => element!("Al", 13, 1.21, 1.84),
    "Si" => element!("Si", 14, 1.20, 2.10),
    "P" => element!("P", 15, 1.05, 1.80),
    "S" => element!("S", 16, 1.02, 1.80),
    "Cl" => element!("Cl", 17, 0.99, 1.75),
    "Ar" => element!("Ar", 18, 1.51, 1.88),
    "K" => element!("K", 19, 2.03, 2.75),
    "Ca" => element!("Ca", 20, 1.76, 2.31),
    "Ti" => element!("Ti", 22, 1.60, 2.00),
    "Cr" => element!("Cr", 24, 1.39, 2.00),
    "Mn" => element!("Mn", 25, 1.61, 2.00),
    "Fe" => element!("Fe", 26, 1.52, 2.00),
    "Co" => element!("Co", 27, 1.26, 2.00),
    "Ni" => element!("Ni", 28, 1.24, 1.63),
    "Cu" => element!("Cu", 29, 1.32, 1.40),
    "Zn" => element!("Zn", 30, 1.22, 1.39),
    "Ga" => element!("Ga", 31, 1.22, 1.87),
    "Ge" => element!("Ge", 32, 1.17, 2.11),
    "As" => element!("As", 33, 1.21, 1.85),
    "Se" => element!("Se", 34, 1.22, 1.90),
    "Br" => element!("Br", 35, 1.21, 1.85),
    "Kr" => element!("Kr", 36, 1.50, 2.02),
    "Rb" => element!("Rb", 37, 2.20, 3.03),
    "Sr" => element!("Sr", 38, 1.95, 2.49),
    "Ag" => element!("Ag", 47, 1.45, 1.72),
    "Cd" => element!("Cd", 48, 1.44, 1.58),
    "Sn" => element!("Sn", 50, 1.39, 2.17),
    "Sb" => element!("Sb", 51, 1.39, 2.06),
    "Te" => element!("Te", 52, 1.47, 2.06),
    "I" => element!("I", 53, 1.40, 1.98),
    "Xe" => element!("Xe", 54, 1.50, 2.16),
    "Cs" => element!("Cs", 55, 2.44, 3.43),
    "Ba" => element!("Ba", 56, 2.15, 2.68),
    "Pt" => element!("Pt", 78, 1.36, 1.75),
    "Au" => element!("Au", 79, 1.36, 1.66),
    "Hg" => element!("Hg", 80, 1.32, 1.55),
    "Pb" => element!("Pb", 82, 1.46, 2.02),
};

/// Looks up an element by symbol, case-insensitively ("CL", "cl" and "Cl" all match).
pub fn by_symbol(symbol: &str) -> Result<&'static ElementData, ElementError> {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    let normalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    };
    ELEMENTS
        .get(normalized.as_str())
        .ok_or_else(|| ElementError::UnknownSymbol(symbol.to_string()))
}

pub fn by_atomic_number(atomic_number: u8) -> Result<&'static ElementData, ElementError> {
    ELEMENTS
        .values()
        .find(|e| e.atomic_number == atomic_number)
        .ok_or(ElementError::UnknownAtomicNumber(atomic_number))
}

pub const HYDROGEN: u8 = 1;

/// Hydrogen-bond donor/acceptor heavy atoms: N, O and F.
pub fn is_hbond_heavy_atom(atomic_number: u8) -> bool {
    matches!(atomic_number, 7..=9)
}

/// True if one side is hydrogen and the other is N, O or F.
pub fn is_hbond_pair(z_a: u8, z_b: u8) -> bool {
    (z_a == HYDROGEN && is_hbond_heavy_atom(z_b)) || (z_b == HYDROGEN && is_hbond_heavy_atom(z_a))
}
