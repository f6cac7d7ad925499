use std::ops::Index;

use crate::basis::BasisFunction;

use super::Integrator;

/// An integral index used in the two-electron integrals of a basis set.
///
/// The index represents the four indices (i, j, k, l) of the integral (ij|kl). Since
/// (ij|kl) = (ji|kl) = (ij|lk) = (kl|ij), the index is stored in canonical order:
/// i >= j, k >= l and ij >= kl, with ij = i * (i + 1) / 2 + j.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IntegralIndex(usize, usize, usize, usize);

impl IntegralIndex {
    /// Creates a new integral index with the given indices.
    pub const fn new(index: (usize, usize, usize, usize)) -> Self {
        let (i, j, k, l) = index;
        let (i, j) = if i >= j { (i, j) } else { (j, i) };
        let (k, l) = if k >= l { (k, l) } else { (l, k) };

        if pair(i, j) >= pair(k, l) {
            Self(i, j, k, l)
        } else {
            Self(k, l, i, j)
        }
    }

    /// Position of this integral in the list of unique integrals
    pub const fn linear(&self) -> usize {
        let &Self(i, j, k, l) = self;
        pair(pair(i, j), pair(k, l))
    }
}

#[inline(always)]
const fn pair(i: usize, j: usize) -> usize {
    i * (i + 1) / 2 + j
}

impl std::fmt::Display for IntegralIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let &Self(i, j, k, l) = self;
        write!(f, "({} {}|{} {})", i, j, k, l)
    }
}

/// An electron tensor representing electron-electron repulsion integrals between
/// four contracted Gaussian functions in a given basis set.
pub struct ElectronTensor {
    /// unique integrals, indexed by [`IntegralIndex::linear`]
    data: Vec<f64>,
    /// side length
    size: usize,
}

impl ElectronTensor {
    /// Computes the electron-electron repulsion integral for each unique combination of
    /// four basis functions. With the `rayon` feature enabled, the integrals are computed
    /// in parallel.
    pub fn from_basis(
        basis: &[BasisFunction],
        integrator: &impl Integrator<Function = BasisFunction>,
    ) -> Self {
        let n_basis = basis.len();
        let n_pairs = pair(n_basis, 0);

        let mut to_compute = Vec::with_capacity(n_pairs * (n_pairs + 1) / 2);
        for i in 0..n_basis {
            for j in 0..=i {
                for k in 0..=i {
                    let l_max = if k == i { j } else { k };
                    for l in 0..=l_max {
                        to_compute.push(IntegralIndex(i, j, k, l));
                    }
                }
            }
        }

        let compute = |index @ &IntegralIndex(i, j, k, l): &IntegralIndex| {
            let integral =
                integrator.electron_repulsion((&basis[i], &basis[j], &basis[k], &basis[l]));
            log::trace!("ERI {index} = {integral:<1.8}");
            (index.linear(), integral)
        };

        let mut data = vec![0.0; n_pairs * (n_pairs + 1) / 2];

        #[cfg(feature = "rayon")]
        {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

            to_compute
                .par_iter()
                .map(compute)
                .collect::<Vec<_>>() // iterators are lazy - we collect to evaluate all elements
                .into_iter()
                .for_each(|(linear, integral)| data[linear] = integral);
        }

        #[cfg(not(feature = "rayon"))]
        to_compute
            .iter()
            .map(compute)
            .for_each(|(linear, integral)| data[linear] = integral);

        Self {
            data,
            size: n_basis,
        }
    }

    /// Number of basis functions
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Index<(usize, usize, usize, usize)> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self[IntegralIndex::new(index)]
    }
}

impl Index<IntegralIndex> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: IntegralIndex) -> &Self::Output {
        &self.data[index.linear()]
    }
}
