//! Reading of connection-table (MOL, V2000) files.
//!
//! Only the header block and the atom block are read. Fields are taken from their fixed
//! column ranges; lines that don't fit the columns are split on whitespace instead.

use std::{fs, path::Path};

use nalgebra::Vector3;

use crate::{
    atom::Atom,
    molecule::{Molecule, ANGSTROM_TO_BOHR},
    periodic_table::ElementType,
};

#[derive(Debug, thiserror::Error)]
pub enum CtabError {
    #[error("failed to read ctab file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ctab: {details} (at line {line})")]
    Parse { line: usize, details: String },
    #[error("only V2000 connection tables are supported")]
    Unsupported,
    #[error("unknown element '{symbol}' (at line {line})")]
    UnknownElement { line: usize, symbol: String },
}

impl CtabError {
    fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

/// The header and atom block of a connection table
#[derive(Debug, Clone, PartialEq)]
pub struct Ctab {
    pub title: String,
    /// the program that wrote the file, columns 2..10 of the second line
    pub program: String,
    pub timestamp: String,
    pub comment: String,
    pub atoms: Vec<CtabAtom>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CtabAtom {
    /// position in Ångström, as written in the file
    pub position: [f64; 3],
    pub symbol: String,
}

/// Characters `start..end` of `line`, or fewer if the line is shorter.
fn columns(line: &str, start: usize, end: Option<usize>) -> String {
    let chars = line.chars().skip(start);
    match end {
        Some(end) => chars.take(end.saturating_sub(start)).collect(),
        None => chars.collect(),
    }
}

impl Ctab {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CtabError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self, CtabError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 4 {
            return Err(CtabError::parse(
                lines.len().max(1),
                "a connection table needs a three line header and a counts line",
            ));
        }

        let title = lines[0].trim_end().to_owned();
        let program = columns(lines[1], 2, Some(10)).trim().to_owned();
        let timestamp = columns(lines[1], 10, None).trim().to_owned();
        let comment = lines[2].trim_end().to_owned();

        let counts = lines[3];
        if counts.contains("V3000") {
            return Err(CtabError::Unsupported);
        }
        let n_atoms = parse_atom_count(counts)?;

        let atom_lines = lines.iter().enumerate().skip(4).take(n_atoms);
        if atom_lines.len() < n_atoms {
            return Err(CtabError::parse(
                lines.len(),
                format!("expected {n_atoms} atoms, but the file ended"),
            ));
        }

        let atoms = atom_lines
            .map(|(index, line)| parse_atom(line, index + 1))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            title,
            program,
            timestamp,
            comment,
            atoms,
        })
    }

    /// Converts the atom block into a molecule, with positions in bohr.
    pub fn molecule(&self) -> Result<Molecule, CtabError> {
        let atoms = self
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                let element = ElementType::from_symbol(&atom.symbol).map_err(|_| {
                    CtabError::UnknownElement {
                        // three header lines and the counts line come first
                        line: index + 5,
                        symbol: atom.symbol.clone(),
                    }
                })?;
                let position = Vector3::from(atom.position) * ANGSTROM_TO_BOHR;
                Ok(Atom::new(element, position))
            })
            .collect::<Result<_, CtabError>>()?;

        Ok(Molecule::from_atoms(atoms))
    }
}

fn parse_atom_count(line: &str) -> Result<usize, CtabError> {
    if let Ok(count) = columns(line, 0, Some(3)).trim().parse() {
        return Ok(count);
    }

    // hand written files don't always keep the counts right aligned
    line.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| CtabError::parse(4, "invalid atom count"))
}

fn parse_atom(line: &str, line_number: usize) -> Result<CtabAtom, CtabError> {
    // hand written files separate the fields with whitespace instead of columns
    parse_atom_columns(line, line_number).or_else(|err| parse_atom_tokens(line).ok_or(err))
}

fn parse_atom_columns(line: &str, line_number: usize) -> Result<CtabAtom, CtabError> {
    let coordinate = |start, axis| {
        columns(line, start, Some(start + 10))
            .trim()
            .parse::<f64>()
            .map_err(|_| CtabError::parse(line_number, format!("invalid {axis} coordinate")))
    };

    let position = [coordinate(0, 'x')?, coordinate(10, 'y')?, coordinate(20, 'z')?];
    let symbol = columns(line, 31, Some(34)).trim().to_owned();
    if symbol.is_empty() {
        return Err(CtabError::parse(line_number, "missing element symbol"));
    }

    Ok(CtabAtom { position, symbol })
}

/// `x y z symbol` as the first four whitespace separated tokens
fn parse_atom_tokens(line: &str) -> Option<CtabAtom> {
    let mut tokens = line.split_whitespace();
    let mut coordinate = || tokens.next()?.parse::<f64>().ok();
    let position = [coordinate()?, coordinate()?, coordinate()?];
    let symbol = tokens.next()?.to_owned();

    Some(CtabAtom { position, symbol })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::{molecule::ANGSTROM_TO_BOHR, periodic_table::ElementType};

    use super::{Ctab, CtabError};

    const WATER: &str = "\
water
  RDKit          3D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.1173 O   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000    0.7572   -0.4692 H   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000   -0.7572   -0.4692 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
M  END
";

    #[test]
    fn header_and_atoms() {
        let ctab = Ctab::parse(WATER).unwrap();

        assert_eq!(ctab.title, "water");
        assert_eq!(ctab.program, "RDKit");
        assert_eq!(ctab.timestamp, "3D");
        assert_eq!(ctab.comment, "");
        assert_eq!(ctab.atoms.len(), 3);
        assert_eq!(ctab.atoms[0].symbol, "O");
        assert_eq!(ctab.atoms[1].position, [0.0, 0.7572, -0.4692]);
        assert_eq!(ctab.atoms[2].symbol, "H");
    }

    #[test]
    fn molecule_is_in_bohr() {
        let molecule = Ctab::parse(WATER).unwrap().molecule().unwrap();
        let atoms = molecule.atoms();

        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0].element(), ElementType::O);
        assert_relative_eq!(atoms[1].position().y, 0.7572 * ANGSTROM_TO_BOHR);
        assert_relative_eq!(atoms[1].position().y, 1.430_9, epsilon = 1e-4);
        assert_eq!(molecule.n_electrons(), 10);
    }

    #[test]
    fn short_header_lines() {
        let text = "\n\n\n  1  0\n    0.0000    0.0000    0.0000 He\n";
        let ctab = Ctab::parse(text).unwrap();

        assert_eq!(ctab.program, "");
        assert_eq!(ctab.timestamp, "");
        assert_eq!(ctab.atoms[0].symbol, "He");
    }

    #[test]
    fn unaligned_atom_count() {
        let text = "h2\n\n\n2 1\n    0.0000    0.0000    0.0000 H\n    0.7400    0.0000    0.0000 H\n";
        let ctab = Ctab::parse(text).unwrap();

        assert_eq!(ctab.atoms.len(), 2);
        assert_eq!(ctab.atoms[1].position[0], 0.74);
    }

    #[test]
    fn whitespace_separated_atoms() {
        let text = "h2\n\n\n2 1\n0.0 0.0 0.0 H\n0.74 0.0 0.0 H\n";
        let ctab = Ctab::parse(text).unwrap();

        assert_eq!(ctab.atoms.len(), 2);
        assert_eq!(ctab.atoms[0].symbol, "H");
        assert_eq!(ctab.atoms[1].position, [0.74, 0.0, 0.0]);

        let molecule = ctab.molecule().unwrap();
        assert_relative_eq!(molecule.atoms()[1].position().x, 0.74 * ANGSTROM_TO_BOHR);
    }

    #[test]
    fn whitespace_fallback_keeps_fixed_column_error() {
        let text = "h\n\n\n1 0\n0.0 0.0\n";

        match Ctab::parse(text) {
            Err(CtabError::Parse { line, details }) => {
                assert_eq!(line, 5);
                assert!(details.contains('x'));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_atom_block() {
        let text = "h2\n\n\n  2  1\n    0.0000    0.0000    0.0000 H\n";

        match Ctab::parse(text) {
            Err(CtabError::Parse { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn bad_coordinate() {
        let text = "h\n\n\n  1  0\n    0.0000    abcdef    0.0000 H\n";

        match Ctab::parse(text) {
            Err(CtabError::Parse { line, details }) => {
                assert_eq!(line, 5);
                assert!(details.contains('y'));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn v3000_is_rejected() {
        let text = "\n\n\n  0  0  0     0  0            999 V3000\nM  V30 BEGIN CTAB\n";

        assert!(matches!(Ctab::parse(text), Err(CtabError::Unsupported)));
    }

    #[test]
    fn unknown_element() {
        let text = "x\n\n\n  1  0\n    0.0000    0.0000    0.0000 Xx\n";
        let ctab = Ctab::parse(text).unwrap();

        match ctab.molecule() {
            Err(CtabError::UnknownElement { line, symbol }) => {
                assert_eq!(line, 5);
                assert_eq!(symbol, "Xx");
            }
            other => panic!("expected an unknown element, got {other:?}"),
        }
    }

    #[test]
    fn atomic_numbers_are_not_symbols() {
        let text = "o\n\n\n  1  0\n    0.0000    0.0000    0.0000 8\n";
        let ctab = Ctab::parse(text).unwrap();

        match ctab.molecule() {
            Err(CtabError::UnknownElement { line, symbol }) => {
                assert_eq!(line, 5);
                assert_eq!(symbol, "8");
            }
            other => panic!("expected an unknown element, got {other:?}"),
        }
    }
}
