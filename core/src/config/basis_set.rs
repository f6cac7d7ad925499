use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    basis::{AtomicBasis, BasisSet, ContractedGaussian, ElectronShell, Gaussian},
    periodic_table::ElementType,
};

/// Basis sets shipped with the crate, by lowercase name.
const BUILTIN_BASIS_SETS: &[(&str, &str)] = &[
    ("sto-3g", include_str!("../../data/basis/sto-3g.json")),
    ("6-31g", include_str!("../../data/basis/6-31g.json")),
];

#[derive(Debug, thiserror::Error)]
pub enum BasisError {
    #[error("failed to read basis set: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid basis set json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid number '{0}' in basis set")]
    InvalidNumber(String),
    #[error("malformed electron shell for {element}: {details}")]
    Malformed {
        element: ElementType,
        details: String,
    },
    #[error("'{0}' is neither a bundled basis set nor a readable file")]
    UnknownBasis(String),
}

/// A basis set in the json format of the basis set exchange.
#[derive(Deserialize)]
pub struct ConfigBasisSet {
    #[serde(default)]
    name: Option<String>,
    /// keyed by atomic number
    elements: HashMap<String, ConfigElectronicConfiguration>,
}

#[derive(Deserialize)]
struct ConfigElectronicConfiguration {
    electron_shells: Vec<ConfigElectronShell>,
}

#[derive(Deserialize)]
#[allow(unused)]
struct ConfigElectronShell {
    function_type: String,
    angular_momentum: Vec<i32>,
    exponents: Vec<String>,
    coefficients: Vec<Vec<String>>,
}

impl BasisSet {
    /// Load a basis set exchange json file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BasisError> {
        let path = path.as_ref();
        let config: ConfigBasisSet = serde_json::from_reader(BufReader::new(File::open(path)?))?;

        let mut basis_set = BasisSet::try_from(config)?;
        if basis_set.name().is_empty() {
            basis_set.name = path.display().to_string();
        }
        Ok(basis_set)
    }

    /// Look up a bundled basis set. Names are matched ignoring case and dashes,
    /// so `STO-3G`, `sto3g` and `sto-3g` are all the same set.
    pub fn builtin(name: &str) -> Option<Result<Self, BasisError>> {
        let wanted = simplify_name(name);

        BUILTIN_BASIS_SETS
            .iter()
            .find(|(builtin, _)| simplify_name(builtin) == wanted)
            .map(|(_, json)| {
                let config: ConfigBasisSet = serde_json::from_str(json)?;
                BasisSet::try_from(config)
            })
    }

    /// Resolve a basis set given on the command line: a bundled name first, then a path.
    pub fn resolve(name_or_path: &str) -> Result<Self, BasisError> {
        if let Some(builtin) = Self::builtin(name_or_path) {
            return builtin;
        }

        let path = Path::new(name_or_path);
        if !path.is_file() {
            return Err(BasisError::UnknownBasis(name_or_path.to_owned()));
        }
        Self::load(path)
    }
}

fn simplify_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl TryFrom<ConfigBasisSet> for BasisSet {
    type Error = BasisError;

    fn try_from(value: ConfigBasisSet) -> Result<Self, Self::Error> {
        let mut atomic_mapping = HashMap::with_capacity(value.elements.len());

        for (key, configuration) in value.elements {
            let element = match key.parse::<ElementType>() {
                Ok(element) => element,
                Err(err) => {
                    log::warn!("skipping basis for element '{key}': {err}");
                    continue;
                }
            };

            let mut element_atomic_basis = AtomicBasis::empty();

            for electron_shell in &configuration.electron_shells {
                let exponents = electron_shell
                    .exponents
                    .iter()
                    .map(|exponent| parse_number(exponent))
                    .collect::<Result<Vec<_>, _>>()?;

                for (angular_magnitude, coefficients) in
                    shell_contractions(element, electron_shell)?
                {
                    let coefficients = coefficients
                        .iter()
                        .map(|coefficient| parse_number(coefficient))
                        .collect::<Result<Vec<_>, _>>()?;

                    if coefficients.len() != exponents.len() {
                        return Err(BasisError::Malformed {
                            element,
                            details: format!(
                                "{} exponents but {} coefficients",
                                exponents.len(),
                                coefficients.len()
                            ),
                        });
                    }

                    let mut shell =
                        ElectronShell::new(angular_magnitude, exponents.clone(), coefficients);

                    for angular in generate_angular_vectors(angular_magnitude) {
                        let mut primitives = SmallVec::with_capacity(exponents.len());

                        for (&exponent, &coefficient) in exponents.iter().zip(&shell.coefficients)
                        {
                            let norm = Gaussian::norm(exponent, angular);

                            primitives.push(Gaussian {
                                exponent,
                                coefficient: coefficient * norm,
                                angular,
                            });
                        }

                        shell
                            .basis_functions
                            .push(ContractedGaussian(primitives).normalized());
                    }

                    element_atomic_basis.shells.push(shell);
                }
            }

            log::trace!("{element}: {} shells", element_atomic_basis.shells.len());
            atomic_mapping.insert(element, element_atomic_basis);
        }

        Ok(Self::new(value.name.unwrap_or_default(), atomic_mapping))
    }
}

/// Pairs each angular momentum of a shell with its coefficient row. Combined shells
/// (`[0, 1]` for sp) have one row per angular momentum, general contractions of a
/// single angular momentum may carry several rows.
fn shell_contractions(
    element: ElementType,
    shell: &ConfigElectronShell,
) -> Result<Vec<(i32, &Vec<String>)>, BasisError> {
    match shell.angular_momentum.as_slice() {
        [] => Err(BasisError::Malformed {
            element,
            details: "shell without angular momentum".into(),
        }),
        &[angular_magnitude] => Ok(shell
            .coefficients
            .iter()
            .map(|row| (angular_magnitude, row))
            .collect()),
        angular_momenta if angular_momenta.len() == shell.coefficients.len() => Ok(angular_momenta
            .iter()
            .copied()
            .zip(&shell.coefficients)
            .collect()),
        angular_momenta => Err(BasisError::Malformed {
            element,
            details: format!(
                "{} angular momenta but {} coefficient rows",
                angular_momenta.len(),
                shell.coefficients.len()
            ),
        }),
    }
}

/// Parse a number written in fortran notation, e.g. `0.1543289673E+00` or `0.15D+00`
fn parse_number(raw: &str) -> Result<f64, BasisError> {
    raw.trim()
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|_| BasisError::InvalidNumber(raw.to_owned()))
}

// generate all (i, j, k) such that i + j + k = angular, x components first
fn generate_angular_vectors(angular_magnitude: i32) -> Vec<(i32, i32, i32)> {
    let mut angular_vectors = Vec::with_capacity(8);

    for i in (0..=angular_magnitude).rev() {
        for j in (0..=angular_magnitude - i).rev() {
            angular_vectors.push((i, j, angular_magnitude - i - j));
        }
    }

    angular_vectors
}
