use nalgebra::{Matrix3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymmetryParseError {
    #[error("Expected 3 comma-separated components in '{0}'")]
    ComponentCount(String),
    #[error("Empty component in symmetry operation '{0}'")]
    EmptyComponent(String),
    #[error("Unexpected token '{token}' in symmetry operation component '{component}'")]
    UnexpectedToken { component: String, token: String },
    #[error("Invalid number '{0}' in symmetry operation")]
    InvalidNumber(String),
}

/// A crystallographic symmetry operation acting on fractional coordinates.
///
/// The rotational part is an integer matrix, the translation is fractional.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperation {
    pub rotation: Matrix3<i32>,
    pub translation: Vector3<f64>,
}

impl SymmetryOperation {
    pub fn new(rotation: Matrix3<i32>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn inversion() -> Self {
        Self::new(-Matrix3::identity(), Vector3::zeros())
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation.norm() < 1e-10
    }

    pub fn apply(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.map(|x| x as f64) * frac + self.translation
    }
}

impl Default for SymmetryOperation {
    fn default() -> Self {
        Self::identity()
    }
}

impl FromStr for SymmetryOperation {
    type Err = SymmetryParseError;

    /// Parses a CIF-style triplet such as `-x,y+1/2,-z+1/2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
            .collect::<String>()
            .to_lowercase();
        let components: Vec<&str> = cleaned.split(',').collect();
        if components.len() != 3 {
            return Err(SymmetryParseError::ComponentCount(s.to_string()));
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, component) in components.iter().enumerate() {
            let (coefficients, shift) = parse_component(component)?;
            for col in 0..3 {
                rotation[(row, col)] = coefficients[col];
            }
            translation[row] = shift;
        }
        Ok(Self::new(rotation, translation))
    }
}

fn parse_component(component: &str) -> Result<([i32; 3], f64), SymmetryParseError> {
    if component.is_empty() {
        return Err(SymmetryParseError::EmptyComponent(component.to_string()));
    }

    let mut coefficients = [0i32; 3];
    let mut shift = 0.0;

    // Split into signed terms: "-x+y+1/2" -> ["-x", "+y", "+1/2"]
    let mut terms = Vec::new();
    let mut current = String::new();
    for c in component.chars() {
        if (c == '+' || c == '-') && !current.is_empty() {
            terms.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    terms.push(current);

    for term in terms {
        let (sign, body) = match term.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, term.strip_prefix('+').unwrap_or(&term)),
        };
        if body.is_empty() {
            return Err(SymmetryParseError::UnexpectedToken {
                component: component.to_string(),
                token: term.clone(),
            });
        }
        let axis = match body {
            "x" => Some(0),
            "y" => Some(1),
            "z" => Some(2),
            _ => None,
        };
        match axis {
            Some(idx) => coefficients[idx] += sign,
            None => shift += sign as f64 * parse_number(body)?,
        }
    }
    Ok((coefficients, shift))
}

fn parse_number(token: &str) -> Result<f64, SymmetryParseError> {
    let invalid = || SymmetryParseError::InvalidNumber(token.to_string());
    match token.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().map_err(|_| invalid())?;
            let den: f64 = den.parse().map_err(|_| invalid())?;
            if den == 0.0 {
                return Err(invalid());
            }
            Ok(num / den)
        }
        None => token.parse().map_err(|_| invalid()),
    }
}

fn format_shift(value: f64) -> Option<String> {
    if value.abs() < 1e-8 {
        return None;
    }
    for den in [2, 3, 4, 6, 8, 12] {
        let num = value * den as f64;
        if (num - num.round()).abs() < 1e-6 {
            return Some(format!("{}/{}", num.round() as i64, den));
        }
    }
    Some(format!("{value}"))
}

impl fmt::Display for SymmetryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const AXES: [char; 3] = ['x', 'y', 'z'];
        let mut parts = Vec::with_capacity(3);
        for row in 0..3 {
            let mut s = String::new();
            for (col, axis) in AXES.iter().enumerate() {
                let coefficient = self.rotation[(row, col)];
                if coefficient == 0 {
                    continue;
                }
                if coefficient < 0 {
                    s.push('-');
                } else if !s.is_empty() {
                    s.push('+');
                }
                if coefficient.abs() != 1 {
                    s.push_str(&coefficient.abs().to_string());
                }
                s.push(*axis);
            }
            if let Some(shift) = format_shift(self.translation[row]) {
                if !shift.starts_with('-') && !s.is_empty() {
                    s.push('+');
                }
                s.push_str(&shift);
            }
            if s.is_empty() {
                s.push('0');
            }
            parts.push(s);
        }
        write!(f, "{}", parts.join(","))
    }
}
