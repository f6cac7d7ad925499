mod scf;
pub(super) mod utils;

pub use scf::{
    compute_kinetic_matrix, compute_nuclear_matrix, compute_overlap_matrix,
    restricted_hartree_fock,
};

use nalgebra::{DMatrix, DVector};

use crate::{
    basis::{BasisFunction, BasisSet},
    molecule::Molecule,
    periodic_table::ElementType,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HartreeFockError {
    #[error("the basis set has no functions for {0}")]
    MissingBasis(ElementType),
    #[error("the molecule has no basis functions")]
    EmptyBasis,
    #[error("restricted hartree fock needs a closed shell, but there are {0} electrons")]
    OddElectronCount(i64),
    #[error("DIIS extrapolation failed in iteration {0}")]
    Diis(usize),
    #[error("hartree fock did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },
}

/// The input to a hartree fock calculation
pub struct HartreeFockInput<'a> {
    /// the molecule to run hartree fock for
    pub molecule: &'a Molecule,
    /// what basis set to use
    pub basis_set: &'a BasisSet,
    /// total charge of the molecule
    pub charge: i32,
    /// the maximum number of iterations to try
    pub max_iterations: usize,
    /// the smallest number that isn't treated as zero. For example, if the density
    /// matrix rms changes by less than this, the system is considered converged.
    pub epsilon: f64,
}

impl HartreeFockInput<'_> {
    /// The basis functions of every atom, in atom order
    pub fn basis(&self) -> Result<Vec<BasisFunction>, HartreeFockError> {
        let mut basis = Vec::new();

        for atom in self.molecule.atoms() {
            let atomic_basis = self
                .basis_set
                .for_atom(atom)
                .ok_or(HartreeFockError::MissingBasis(atom.element()))?;

            basis.extend(atomic_basis.basis_for(atom));
        }

        if basis.is_empty() {
            return Err(HartreeFockError::EmptyBasis);
        }
        Ok(basis)
    }

    /// Returns the number of total electrons in the system
    pub fn n_electrons(&self) -> i64 {
        self.molecule.n_electrons() as i64 - i64::from(self.charge)
    }
}

/// The output of a hartree fock calculation
#[derive(Debug)]
#[non_exhaustive]
pub struct HartreeFockOutput {
    /// the basis that was used in the hartree fock calculation. This is necessary
    /// to be able to for example evaluate the molecular orbitals that were found
    pub basis: Vec<BasisFunction>,
    /// molecular orbital coefficients. Row = basis function, column = orbital, the
    /// columns are sorted by ascending orbital energy.
    pub orbital_coefficients: DMatrix<f64>,
    /// the orbital energies that were found in this hartree fock calculation, sorted in
    /// ascending order
    pub orbital_energies: DVector<f64>,
    /// The electronic energy of the system
    pub electronic_energy: f64,
    /// The nuclear repulsion energy
    pub nuclear_repulsion: f64,
    /// After how many iterations did the system converge
    pub iterations: usize,
}

impl HartreeFockOutput {
    pub fn total_energy(&self) -> f64 {
        self.electronic_energy + self.nuclear_repulsion
    }

    /// Evaluate the n-th lowest energy orbital at a given position. Returns `None` if
    /// there is no such orbital.
    pub fn evaluate_orbital(
        &self,
        orbital: usize,
        position: nalgebra::Vector3<f64>,
    ) -> Option<f64> {
        if orbital >= self.orbital_coefficients.ncols() {
            return None;
        }

        let value = self
            .orbital_coefficients
            .column(orbital)
            .iter()
            .zip(&self.basis)
            .map(|(coefficient, function)| coefficient * function.evaluate(position))
            .sum();
        Some(value)
    }
}
