use crate::atom::Atom;

/// Conversion factor from Ångström (structure files) to bohr (everything else).
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_92;

/// Represents a molecule
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub(crate) atoms: Vec<Atom>,
}

impl Molecule {
    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Number of electrons of the neutral molecule
    pub fn n_electrons(&self) -> usize {
        self.atoms
            .iter()
            .map(|atom| atom.element_type.atomic_number() as usize)
            .sum()
    }
}
