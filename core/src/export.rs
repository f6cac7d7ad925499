//! Flattening of a calculation into the command line of the `mo-draw` visualizer.
//!
//! `mo-draw` takes three kinds of arguments:
//! * `-A "[B<basis> X<x> Y<y> Z<z>]"` once per atom, coordinates in bohr;
//! * `-B "[N1 <exponents> L0 <coefficients> N2 ... L1 ...]"` once per atom. `N<n>` opens
//!   the n-th group of primitives, `L<l>` lists the contraction coefficients of the
//!   shell with angular momentum `l` built from that group;
//! * `-C "[<orbital 0>] [<orbital 1>] ..."` with the coefficients of every orbital, in
//!   order of ascending energy.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    process::{Command, ExitStatus},
};

use itertools::Itertools;
use nalgebra::DMatrix;
use serde::Serialize;

use crate::{
    basis::{BasisFunction, BasisSet},
    hf::HartreeFockOutput,
    molecule::Molecule,
    periodic_table::ElementType,
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("the basis set has no functions for {0}")]
    MissingBasis(ElementType),
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}")]
    Drawer { program: String, status: ExitStatus },
}

/// Primitives shared by one or more shells of an atom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellGroup {
    pub exponents: Vec<f64>,
    pub contractions: Vec<Contraction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contraction {
    pub angular_magnitude: i32,
    pub coefficients: Vec<f64>,
}

/// Atom index and position (bohr) of every atom in the molecule.
pub fn collect_atoms(molecule: &Molecule) -> Vec<(usize, [f64; 3])> {
    molecule
        .atoms()
        .iter()
        .enumerate()
        .map(|(index, atom)| {
            let position = atom.position();
            (index, [position.x, position.y, position.z])
        })
        .collect()
}

/// Groups the shells of every atom by their primitives. Every s shell opens a new group,
/// the shells after it (p, d, ...) add their coefficients to that group. This matches
/// split-valence basis sets, where an sp shell is stored as an s and a p shell with the
/// same exponents.
pub fn collect_basis_set(
    molecule: &Molecule,
    basis_set: &BasisSet,
) -> Result<BTreeMap<usize, Vec<ShellGroup>>, ExportError> {
    let mut groups = BTreeMap::new();

    for (index, atom) in molecule.atoms().iter().enumerate() {
        let atomic_basis = basis_set
            .for_atom(atom)
            .ok_or(ExportError::MissingBasis(atom.element()))?;

        let mut atom_groups: Vec<ShellGroup> = Vec::new();
        for shell in atomic_basis.shells() {
            let opens_group = shell.angular_magnitude() == 0 || atom_groups.is_empty();
            if opens_group {
                atom_groups.push(ShellGroup {
                    exponents: shell.exponents().to_vec(),
                    contractions: Vec::new(),
                });
            }

            let contraction = Contraction {
                angular_magnitude: shell.angular_magnitude(),
                coefficients: shell.coefficients().to_vec(),
            };
            if let Some(group) = atom_groups.last_mut() {
                group.contractions.push(contraction);
            }
        }

        log::debug!("atom {index} ({}): {} shell groups", atom.element(), atom_groups.len());
        groups.insert(index, atom_groups);
    }

    Ok(groups)
}

fn join(values: &[f64]) -> String {
    values.iter().join(" ")
}

fn atom_arg(basis: usize, [x, y, z]: [f64; 3]) -> String {
    format!("[B{basis} X{x} Y{y} Z{z}]")
}

fn basis_arg(groups: &[ShellGroup]) -> String {
    let mut items = Vec::new();
    for (n, group) in groups.iter().enumerate() {
        items.push(format!("N{}", n + 1));
        if !group.exponents.is_empty() {
            items.push(join(&group.exponents));
        }
        for contraction in &group.contractions {
            items.push(format!("L{}", contraction.angular_magnitude));
            if !contraction.coefficients.is_empty() {
                items.push(join(&contraction.coefficients));
            }
        }
    }
    format!("[{}]", items.join(" "))
}

/// One bracketed group per column (orbital) of `coefficients`.
fn coefficients_arg(coefficients: &DMatrix<f64>) -> String {
    coefficients
        .column_iter()
        .map(|orbital| format!("[{}]", orbital.iter().join(" ")))
        .join(" ")
}

/// The formatted arguments of a `mo-draw` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawArgs {
    pub bases: Vec<String>,
    pub atoms: Vec<String>,
    pub coefficients: String,
}

impl DrawArgs {
    /// Every atom uses the basis with its own index. `coefficients` holds one orbital
    /// per column, with rows in basis function order.
    pub fn new(
        atoms: &[(usize, [f64; 3])],
        basis_set: &BTreeMap<usize, Vec<ShellGroup>>,
        coefficients: &DMatrix<f64>,
    ) -> Self {
        Self {
            bases: basis_set.values().map(|groups| basis_arg(groups)).collect(),
            atoms: atoms
                .iter()
                .map(|&(index, position)| atom_arg(index, position))
                .collect(),
            coefficients: coefficients_arg(coefficients),
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2 * (self.bases.len() + self.atoms.len() + 1));
        for basis in &self.bases {
            args.push("-B".to_owned());
            args.push(basis.clone());
        }
        for atom in &self.atoms {
            args.push("-A".to_owned());
            args.push(atom.clone());
        }
        args.push("-C".to_owned());
        args.push(self.coefficients.clone());
        args
    }

    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut command = Command::new(program);
        command.args(self.args());
        command
    }

    /// The invocation as it would be typed in a POSIX shell
    pub fn shell_line(&self, program: &str) -> String {
        std::iter::once(quote(program))
            .chain(self.args().iter().map(|arg| quote(arg)))
            .join(" ")
    }

    /// Runs `program` with these arguments and waits for it to exit.
    pub fn run(&self, program: &str) -> Result<(), ExportError> {
        log::info!("starting {program}");
        let status = self
            .command(program)
            .status()
            .map_err(|source| ExportError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        if !status.success() {
            return Err(ExportError::Drawer {
                program: program.to_owned(),
                status,
            });
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:".contains(c));
    if plain {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Everything handed to the visualizer, plus the energies, for `--dump`.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub title: &'a str,
    pub basis_set: &'a str,
    pub atoms: Vec<SnapshotAtom>,
    pub basis: &'a BTreeMap<usize, Vec<ShellGroup>>,
    /// the normalized functions the orbitals are expanded in, in coefficient order
    pub basis_functions: &'a [BasisFunction],
    pub orbital_energies: Vec<f64>,
    /// one entry per orbital
    pub orbital_coefficients: Vec<Vec<f64>>,
    pub electronic_energy: f64,
    pub nuclear_repulsion: f64,
    pub total_energy: f64,
    pub iterations: usize,
}

#[derive(Debug, Serialize)]
pub struct SnapshotAtom {
    pub element: ElementType,
    pub position: [f64; 3],
}

impl<'a> Snapshot<'a> {
    pub fn new(
        title: &'a str,
        molecule: &Molecule,
        basis_set: &'a BasisSet,
        basis: &'a BTreeMap<usize, Vec<ShellGroup>>,
        output: &'a HartreeFockOutput,
    ) -> Self {
        Self {
            title,
            basis_set: basis_set.name(),
            atoms: molecule
                .atoms()
                .iter()
                .map(|atom| {
                    let position = atom.position();
                    SnapshotAtom {
                        element: atom.element(),
                        position: [position.x, position.y, position.z],
                    }
                })
                .collect(),
            basis,
            basis_functions: &output.basis,
            orbital_energies: output.orbital_energies.iter().copied().collect(),
            orbital_coefficients: output
                .orbital_coefficients
                .column_iter()
                .map(|orbital| orbital.iter().copied().collect())
                .collect(),
            electronic_energy: output.electronic_energy,
            nuclear_repulsion: output.nuclear_repulsion,
            total_energy: output.total_energy(),
            iterations: output.iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nalgebra::{dmatrix, Vector3};

    use crate::{atom::Atom, basis::BasisSet, molecule::Molecule, periodic_table::ElementType};

    use super::{collect_atoms, collect_basis_set, Contraction, DrawArgs, ExportError, ShellGroup};

    fn sto_3g() -> BasisSet {
        BasisSet::builtin("sto-3g").unwrap().unwrap()
    }

    fn water() -> Molecule {
        Molecule::from_atoms(vec![
            Atom::new(ElementType::O, Vector3::new(0.0, 0.0, 0.25)),
            Atom::new(ElementType::H, Vector3::new(0.0, 1.5, -0.75)),
            Atom::new(ElementType::H, Vector3::new(0.0, -1.5, -0.75)),
        ])
    }

    #[test]
    fn atoms_keep_their_order() {
        assert_eq!(
            collect_atoms(&water()),
            vec![
                (0, [0.0, 0.0, 0.25]),
                (1, [0.0, 1.5, -0.75]),
                (2, [0.0, -1.5, -0.75]),
            ]
        );
    }

    #[test]
    fn sp_shells_share_a_group() {
        let groups = collect_basis_set(&water(), &sto_3g()).unwrap();

        assert_eq!(groups.len(), 3);

        let oxygen = &groups[&0];
        assert_eq!(oxygen.len(), 2);
        assert_eq!(oxygen[0].exponents, vec![130.7093214, 23.80886605, 6.443608313]);
        assert_eq!(oxygen[0].contractions.len(), 1);
        assert_eq!(oxygen[0].contractions[0].angular_magnitude, 0);

        let angular: Vec<_> = oxygen[1]
            .contractions
            .iter()
            .map(|contraction| contraction.angular_magnitude)
            .collect();
        assert_eq!(angular, vec![0, 1]);
        assert_eq!(oxygen[1].exponents, vec![5.033151319, 1.169596125, 0.38038896]);
        assert_eq!(
            oxygen[1].contractions[1].coefficients,
            vec![0.155916275, 0.6076837186, 0.3919573931]
        );

        assert_eq!(groups[&1].len(), 1);
        assert_eq!(groups[&1], groups[&2]);
    }

    #[test]
    fn missing_basis() {
        let molecule = Molecule::from_atoms(vec![Atom::new(ElementType::Kr, Vector3::zeros())]);

        assert!(matches!(
            collect_basis_set(&molecule, &sto_3g()),
            Err(ExportError::MissingBasis(ElementType::Kr))
        ));
    }

    #[test]
    fn argument_grammar() {
        let atoms = vec![(0, [0.0, 0.0, 1.5]), (1, [0.0, -0.5, -1.5])];
        let mut basis = BTreeMap::new();
        basis.insert(
            0,
            vec![
                ShellGroup {
                    exponents: vec![3.0, 0.5],
                    contractions: vec![Contraction {
                        angular_magnitude: 0,
                        coefficients: vec![0.25, 0.75],
                    }],
                },
                ShellGroup {
                    exponents: vec![1.0, 0.125],
                    contractions: vec![
                        Contraction {
                            angular_magnitude: 0,
                            coefficients: vec![-0.5, 1.0],
                        },
                        Contraction {
                            angular_magnitude: 1,
                            coefficients: vec![0.5, 0.5],
                        },
                    ],
                },
            ],
        );
        basis.insert(
            1,
            vec![ShellGroup {
                exponents: vec![2.0],
                contractions: vec![Contraction {
                    angular_magnitude: 0,
                    coefficients: vec![1.0],
                }],
            }],
        );
        let coefficients = dmatrix![0.5, -1.0; 0.25, 2.0];

        let draw = DrawArgs::new(&atoms, &basis, &coefficients);

        assert_eq!(
            draw.bases,
            vec![
                "[N1 3 0.5 L0 0.25 0.75 N2 1 0.125 L0 -0.5 1 L1 0.5 0.5]",
                "[N1 2 L0 1]",
            ]
        );
        assert_eq!(draw.atoms, vec!["[B0 X0 Y0 Z1.5]", "[B1 X0 Y-0.5 Z-1.5]"]);
        // orbitals are columns
        assert_eq!(draw.coefficients, "[0.5 0.25] [-1 2]");

        assert_eq!(
            draw.args(),
            vec![
                "-B",
                "[N1 3 0.5 L0 0.25 0.75 N2 1 0.125 L0 -0.5 1 L1 0.5 0.5]",
                "-B",
                "[N1 2 L0 1]",
                "-A",
                "[B0 X0 Y0 Z1.5]",
                "-A",
                "[B1 X0 Y-0.5 Z-1.5]",
                "-C",
                "[0.5 0.25] [-1 2]",
            ]
        );
    }

    #[test]
    fn shell_line_quotes_arguments() {
        let draw = DrawArgs {
            bases: vec!["[N1 1 L0 1]".into()],
            atoms: vec!["[B0 X0 Y0 Z0]".into()],
            coefficients: "[1]".into(),
        };

        assert_eq!(
            draw.shell_line("mo-draw"),
            "mo-draw -B '[N1 1 L0 1]' -A '[B0 X0 Y0 Z0]' -C '[1]'"
        );
        assert_eq!(super::quote("it's"), r"'it'\''s'");
        assert!(draw
            .shell_line("/opt/mo draw")
            .starts_with("'/opt/mo draw' -B '[N1"));
    }

    #[test]
    fn command_arguments() {
        let draw = DrawArgs {
            bases: vec!["[N1 1 L0 1]".into()],
            atoms: vec!["[B0 X0 Y0 Z0]".into()],
            coefficients: "[1]".into(),
        };
        let command = draw.command("mo-draw");

        assert_eq!(command.get_program(), "mo-draw");
        assert_eq!(command.get_args().count(), 6);
    }

    #[cfg(unix)]
    #[test]
    fn failing_drawer_is_an_error() {
        let draw = DrawArgs {
            bases: Vec::new(),
            atoms: Vec::new(),
            coefficients: "[1]".into(),
        };

        assert!(draw.run("true").is_ok());
        assert!(matches!(draw.run("false"), Err(ExportError::Drawer { .. })));
        assert!(matches!(
            draw.run("/nonexistent/mo-draw"),
            Err(ExportError::Spawn { .. })
        ));
    }
}
