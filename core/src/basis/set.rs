use std::collections::HashMap;

use crate::{atom::Atom, periodic_table::ElementType};

use super::{BasisFunction, ContractedGaussian};

#[derive(Debug)]
pub struct BasisSet {
    pub(crate) name: String,
    atomic_mapping: HashMap<ElementType, AtomicBasis>,
}

impl BasisSet {
    /// Returns the basis of a given atom, if it exists.
    pub fn for_atom(&self, atom: &Atom) -> Option<&AtomicBasis> {
        self.atomic_mapping.get(&atom.element_type)
    }

    /// Returns the basis of a given element, if it exists.
    pub fn for_element(&self, element: ElementType) -> Option<&AtomicBasis> {
        self.atomic_mapping.get(&element)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new basis set given mappings from element type to the basis of that element
    pub(crate) fn new(name: String, atomic_mapping: HashMap<ElementType, AtomicBasis>) -> Self {
        Self {
            name,
            atomic_mapping,
        }
    }
}

/// Represents the basis functions for a single atom.
#[derive(Debug)]
pub struct AtomicBasis {
    pub(crate) shells: Vec<ElectronShell>,
}

impl AtomicBasis {
    pub(crate) fn empty() -> Self {
        Self { shells: Vec::new() }
    }

    pub fn shells(&self) -> &[ElectronShell] {
        &self.shells
    }

    pub fn basis_functions(&self) -> impl Iterator<Item = &ContractedGaussian> {
        self.shells.iter().flat_map(|shell| &shell.basis_functions)
    }

    /// The basis functions of this atomic basis, centered on `atom`
    pub fn basis_for<'a>(&'a self, atom: &'a Atom) -> impl Iterator<Item = BasisFunction> + 'a {
        self.basis_functions()
            .map(move |contracted_gaussian| BasisFunction {
                contracted_gaussian: contracted_gaussian.clone(),
                position: atom.position,
            })
    }
}

/// A shell of a single angular momentum. `exponents` and `coefficients` are kept as they
/// were read from the basis set file; the normalized cartesian components live in
/// `basis_functions`.
#[derive(Debug, Clone)]
pub struct ElectronShell {
    pub(crate) angular_magnitude: i32,
    pub(crate) exponents: Vec<f64>,
    pub(crate) coefficients: Vec<f64>,
    pub(crate) basis_functions: Vec<ContractedGaussian>,
}

impl ElectronShell {
    pub(crate) fn new(angular_magnitude: i32, exponents: Vec<f64>, coefficients: Vec<f64>) -> Self {
        Self {
            angular_magnitude,
            exponents,
            coefficients,
            basis_functions: Vec::new(),
        }
    }

    pub fn angular_magnitude(&self) -> i32 {
        self.angular_magnitude
    }

    pub fn exponents(&self) -> &[f64] {
        &self.exponents
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn basis_functions(&self) -> &[ContractedGaussian] {
        &self.basis_functions
    }
}
