pub use basis_set::{BasisError, ConfigBasisSet};

mod basis_set;
