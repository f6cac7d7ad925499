//! McMurchie Davidon integration scheme.
//! Reference:
//!
//! [1] Goings, J. Integrals. https://joshuagoings.com/2017/04/28/integrals/
use nalgebra::Vector3;

use crate::{
    atom::Atom,
    basis::{BasisFunction, ContractedGaussian, Gaussian},
};

use super::{
    utils::{coulomb_auxiliary, hermite_expansion},
    Integrator,
};

#[derive(Default, Clone, Copy, Debug)]
pub struct McMurchieDavidson;

impl Integrator for McMurchieDavidson {
    type Function = BasisFunction;

    fn overlap(&self, functions: (&Self::Function, &Self::Function)) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_a.position - basis_b.position;

        let ContractedGaussian(data_a) = &basis_a.contracted_gaussian;
        let ContractedGaussian(data_b) = &basis_b.contracted_gaussian;

        let mut output = 0.0;
        for (&primitive_a, &primitive_b) in itertools::iproduct!(data_a, data_b) {
            output += primitive_a.coefficient
                * primitive_b.coefficient
                * primitive_overlap(primitive_a, primitive_b, diff);
        }
        output
    }

    fn kinetic(&self, functions: (&Self::Function, &Self::Function)) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_a.position - basis_b.position;

        let ContractedGaussian(data_a) = &basis_a.contracted_gaussian;
        let ContractedGaussian(data_b) = &basis_b.contracted_gaussian;

        let mut output = 0.0;
        for (&primitive_a, &primitive_b) in itertools::iproduct!(data_a, data_b) {
            output += primitive_a.coefficient
                * primitive_b.coefficient
                * primitive_kinetic(primitive_a, primitive_b, diff);
        }
        output
    }

    fn nuclear(&self, functions: (&Self::Function, &Self::Function), nuclei: &[Atom]) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_a.position - basis_b.position;

        let ContractedGaussian(data_a) = &basis_a.contracted_gaussian;
        let ContractedGaussian(data_b) = &basis_b.contracted_gaussian;

        let mut output = 0.0;
        for (&primitive_a, &primitive_b) in itertools::iproduct!(data_a, data_b) {
            let product_center = product_center(
                basis_a.position,
                primitive_a.exponent,
                basis_b.position,
                primitive_b.exponent,
            );

            for nucleus in nuclei {
                output += primitive_a.coefficient
                    * primitive_b.coefficient
                    * primitive_nuclear(primitive_a, primitive_b, diff, product_center, nucleus)
            }
        }

        output
    }

    fn electron_repulsion(
        &self,
        functions: (
            &Self::Function,
            &Self::Function,
            &Self::Function,
            &Self::Function,
        ),
    ) -> f64 {
        let (basis_a, basis_b, basis_c, basis_d) = functions;
        let diff_ab = basis_a.position - basis_b.position;
        let diff_cd = basis_c.position - basis_d.position;

        let ContractedGaussian(data_a) = &basis_a.contracted_gaussian;
        let ContractedGaussian(data_b) = &basis_b.contracted_gaussian;
        let ContractedGaussian(data_c) = &basis_c.contracted_gaussian;
        let ContractedGaussian(data_d) = &basis_d.contracted_gaussian;

        let mut output = 0.0;
        for (&primitive_a, &primitive_b) in itertools::iproduct!(data_a, data_b) {
            let product_center_ab = product_center(
                basis_a.position,
                primitive_a.exponent,
                basis_b.position,
                primitive_b.exponent,
            );

            for (&primitive_c, &primitive_d) in itertools::iproduct!(data_c, data_d) {
                let product_center_cd = product_center(
                    basis_c.position,
                    primitive_c.exponent,
                    basis_d.position,
                    primitive_d.exponent,
                );

                output += primitive_a.coefficient
                    * primitive_b.coefficient
                    * primitive_c.coefficient
                    * primitive_d.coefficient
                    * primitive_electron(
                        [primitive_a, primitive_b, primitive_c, primitive_d],
                        diff_ab,
                        diff_cd,
                        product_center_ab - product_center_cd,
                    )
            }
        }

        output
    }
}

fn primitive_overlap(primitive_a: Gaussian, primitive_b: Gaussian, diff: Vector3<f64>) -> f64 {
    let Gaussian {
        exponent: exp_a,
        angular: (l1, m1, n1),
        ..
    } = primitive_a;

    let Gaussian {
        exponent: exp_b,
        angular: (l2, m2, n2),
        ..
    } = primitive_b;

    hermite_expansion([l1, l2, 0], diff.x, exp_a, exp_b)
        * hermite_expansion([m1, m2, 0], diff.y, exp_a, exp_b)
        * hermite_expansion([n1, n2, 0], diff.z, exp_a, exp_b)
        * (std::f64::consts::PI / (exp_a + exp_b)).powi(3).sqrt()
}

fn primitive_kinetic(primitive_a: Gaussian, primitive_b: Gaussian, diff: Vector3<f64>) -> f64 {
    let Gaussian {
        exponent: b_exp,
        angular: (l, m, n),
        ..
    } = primitive_b;

    let angular_step =
        |i, j, k| primitive_overlap(primitive_a, add_angular(primitive_b, [i, j, k]), diff);

    let term_0 =
        b_exp * (2 * (l + m + n) + 3) as f64 * primitive_overlap(primitive_a, primitive_b, diff);
    let term_1 = -2.0
        * b_exp.powi(2)
        * (angular_step(2, 0, 0) + angular_step(0, 2, 0) + angular_step(0, 0, 2));
    let term_2 = -0.5
        * ((l * (l - 1)) as f64 * angular_step(-2, 0, 0)
            + (m * (m - 1)) as f64 * angular_step(0, -2, 0)
            + (n * (n - 1)) as f64 * angular_step(0, 0, -2));
    term_0 + term_1 + term_2
}

fn primitive_nuclear(
    primitive_a: Gaussian,
    primitive_b: Gaussian,
    // difference of the positions of the two basis functions: a - b
    diff: Vector3<f64>,
    // the product center of the two basis functions
    product_center: Vector3<f64>,
    nucleus: &Atom,
) -> f64 {
    let Gaussian {
        exponent: a,
        angular: (l1, m1, n1),
        ..
    } = primitive_a;

    let Gaussian {
        exponent: b,
        angular: (l2, m2, n2),
        ..
    } = primitive_b;

    let p = a + b;
    let diff_nucleus = product_center - nucleus.position;

    let mut sum = 0.0;
    for t in 0..=l1 + l2 {
        let e1 = hermite_expansion([l1, l2, t], diff.x, a, b);
        for u in 0..=m1 + m2 {
            let e2 = hermite_expansion([m1, m2, u], diff.y, a, b);
            for v in 0..=n1 + n2 {
                let e3 = hermite_expansion([n1, n2, v], diff.z, a, b);
                sum += e1 * e2 * e3 * coulomb_auxiliary(t, u, v, 0, p, diff_nucleus)
            }
        }
    }
    (-nucleus.nuclear_charge() as f64 * std::f64::consts::TAU / p) * sum
}

fn primitive_electron(
    [primitive_a, primitive_b, primitive_c, primitive_d]: [Gaussian; 4],
    diff_ab: Vector3<f64>,
    diff_cd: Vector3<f64>,
    // product center ab - product center cd
    diff_product: Vector3<f64>,
) -> f64 {
    let Gaussian {
        exponent: a,
        angular: (l1, m1, n1),
        ..
    } = primitive_a;
    let Gaussian {
        exponent: b,
        angular: (l2, m2, n2),
        ..
    } = primitive_b;
    let Gaussian {
        exponent: c,
        angular: (l3, m3, n3),
        ..
    } = primitive_c;
    let Gaussian {
        exponent: d,
        angular: (l4, m4, n4),
        ..
    } = primitive_d;

    let p = a + b;
    let q = c + d;
    let alpha = p * q / (p + q);

    let mut sum = 0.0;
    for (t1, u1, v1) in itertools::iproduct!(0..=l1 + l2, 0..=m1 + m2, 0..=n1 + n2) {
        let e_ab = hermite_expansion([l1, l2, t1], diff_ab.x, a, b)
            * hermite_expansion([m1, m2, u1], diff_ab.y, a, b)
            * hermite_expansion([n1, n2, v1], diff_ab.z, a, b);

        for (t2, u2, v2) in itertools::iproduct!(0..=l3 + l4, 0..=m3 + m4, 0..=n3 + n4) {
            let e_cd = hermite_expansion([l3, l4, t2], diff_cd.x, c, d)
                * hermite_expansion([m3, m4, u2], diff_cd.y, c, d)
                * hermite_expansion([n3, n4, v2], diff_cd.z, c, d);

            // (-1)^(t2 + u2 + v2)
            let sign = if (t2 + u2 + v2) % 2 == 0 { 1.0 } else { -1.0 };

            sum += e_ab
                * e_cd
                * sign
                * coulomb_auxiliary(t1 + t2, u1 + u2, v1 + v2, 0, alpha, diff_product)
        }
    }

    2.0 * std::f64::consts::PI.powi(5).sqrt() * (p * q * (p + q).sqrt()).recip() * sum
}

#[inline(always)]
fn add_angular(gaussian: Gaussian, [i, j, k]: [i32; 3]) -> Gaussian {
    let Gaussian {
        angular: (l, m, n), ..
    } = gaussian;

    Gaussian {
        angular: (l + i, m + j, n + k),
        ..gaussian
    }
}

#[inline(always)]
fn product_center(
    a_pos: Vector3<f64>,
    a_exp: f64,
    b_pos: Vector3<f64>,
    b_exp: f64,
) -> Vector3<f64> {
    (a_exp * a_pos + b_exp * b_pos) / (a_exp + b_exp)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use smallvec::smallvec;

    use crate::{
        atom::Atom,
        basis::{BasisFunction, ContractedGaussian, Gaussian},
        integrals::Integrator,
        periodic_table::ElementType,
    };

    use super::McMurchieDavidson;

    fn trivial(angular: (i32, i32, i32)) -> Gaussian {
        Gaussian {
            exponent: 1.0,
            coefficient: 1.0,
            angular,
        }
    }

    fn normalized_s(exponent: f64, position: Vector3<f64>) -> BasisFunction {
        BasisFunction {
            contracted_gaussian: ContractedGaussian(smallvec![Gaussian {
                exponent,
                coefficient: Gaussian::norm(exponent, (0, 0, 0)),
                angular: (0, 0, 0),
            }]),
            position,
        }
    }

    #[test]
    fn test_primitive_overlap() {
        let diff = Vector3::new(1.0, 0.0, 0.0);

        assert_relative_eq!(
            super::primitive_overlap(trivial((0, 0, 0)), trivial((0, 0, 0)), diff),
            1.194077663824459,
            epsilon = 1e-12
        );
        // p orbitals perpendicular to the separation keep half the exponent weight
        assert_relative_eq!(
            super::primitive_overlap(trivial((0, 1, 0)), trivial((0, 1, 0)), diff),
            0.29851941595611475,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            super::primitive_overlap(trivial((0, 0, 1)), trivial((0, 0, 1)), diff),
            0.29851941595611475,
            epsilon = 1e-12
        );
        // antisymmetric along the separation: px/px overlap has a negative contribution
        assert_relative_eq!(
            super::primitive_overlap(trivial((1, 0, 0)), trivial((1, 0, 0)), diff),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn normalized_function_has_unit_overlap() {
        let function = normalized_s(0.7, Vector3::new(0.3, -1.0, 2.0));

        assert_relative_eq!(
            McMurchieDavidson.overlap((&function, &function)),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn kinetic_energy_of_s_gaussian() {
        // <T> = 3a/2 for a normalized s gaussian
        let function = normalized_s(0.8, Vector3::zeros());

        assert_relative_eq!(
            McMurchieDavidson.kinetic((&function, &function)),
            1.2,
            epsilon = 1e-10
        );
    }

    #[test]
    fn nuclear_attraction_of_s_gaussian() {
        // <-1/r> = -2 sqrt(2a/pi) for a normalized s gaussian centered on the nucleus
        let exponent = 0.5;
        let function = normalized_s(exponent, Vector3::zeros());
        let proton = Atom::new(ElementType::H, Vector3::zeros());

        assert_relative_eq!(
            McMurchieDavidson.nuclear((&function, &function), &[proton]),
            -2.0 * (2.0 * exponent / std::f64::consts::PI).sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn electron_repulsion_of_s_gaussian() {
        // (ss|ss) = 2 sqrt(a/pi) for four identical normalized s gaussians
        let exponent = 1.3;
        let function = normalized_s(exponent, Vector3::zeros());

        assert_relative_eq!(
            McMurchieDavidson.electron_repulsion((&function, &function, &function, &function)),
            2.0 * (exponent / std::f64::consts::PI).sqrt(),
            epsilon = 1e-6
        );
    }
}
