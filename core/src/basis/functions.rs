use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Function of the form K*x^i*y^j*z^k*exp(-alpha*x^2)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub exponent: f64,
    /// The coefficient of this gaussian and optionally the normalization constant
    pub coefficient: f64,
    /// (i, j, k) exponents of polynomial terms
    pub angular: (i32, i32, i32),
}

impl Gaussian {
    pub fn norm(exponent: f64, angular: (i32, i32, i32)) -> f64 {
        let (i, j, k) = angular;

        (std::f64::consts::FRAC_2_PI * exponent)
            .powi(3)
            .sqrt()
            .sqrt()
            * f64::sqrt(
                (8.0 * exponent).powi(i + j + k)
                    * (factorial(i) * factorial(j) * factorial(k))
                    / (factorial(2 * i) * factorial(2 * j) * factorial(2 * k)),
            )
    }

    /// Evaluate this gaussian centered at the origin, at `r`
    pub fn evaluate(&self, r: Vector3<f64>) -> f64 {
        let (i, j, k) = self.angular;

        self.coefficient
            * r.x.powi(i)
            * r.y.powi(j)
            * r.z.powi(k)
            * f64::exp(-self.exponent * r.norm_squared())
    }
}

fn factorial(n: i32) -> f64 {
    (2..=n).map(f64::from).product()
}

fn double_factorial(n: i32) -> f64 {
    (1..=n).rev().step_by(2).map(f64::from).product()
}

/// Linear combination of many [`Gaussian`]s
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractedGaussian(pub SmallVec<[Gaussian; 6]>);

impl ContractedGaussian {
    /// Rescale the coefficients so the contracted function has unit norm. The primitives
    /// are expected to carry their own normalization constant already.
    pub fn normalized(mut self) -> Self {
        let ContractedGaussian(ref mut primitives) = self;

        let mut self_overlap = 0.0;
        for (a, b) in itertools::iproduct!(primitives.iter(), primitives.iter()) {
            self_overlap += a.coefficient * b.coefficient * same_center_overlap(a, b);
        }

        if self_overlap > 0.0 {
            let scale = self_overlap.sqrt().recip();
            for primitive in primitives.iter_mut() {
                primitive.coefficient *= scale;
            }
        }

        self
    }

    pub fn angular(&self) -> Option<(i32, i32, i32)> {
        self.0.first().map(|primitive| primitive.angular)
    }
}

/// Overlap of two primitives without coefficients sharing center and angular part
fn same_center_overlap(a: &Gaussian, b: &Gaussian) -> f64 {
    let (i, j, k) = a.angular;
    let p = a.exponent + b.exponent;

    (std::f64::consts::PI / p).powi(3).sqrt()
        * double_factorial(2 * i - 1)
        * double_factorial(2 * j - 1)
        * double_factorial(2 * k - 1)
        / (2.0 * p).powi(i + j + k)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisFunction {
    /// The type of basis function this basis function has
    pub contracted_gaussian: ContractedGaussian,
    /// The position of this basis function, in natural units
    pub position: Vector3<f64>,
}

impl BasisFunction {
    /// Evaluate this basis function at a given position
    pub fn evaluate(&self, at: Vector3<f64>) -> f64 {
        let ContractedGaussian(ref primitives) = self.contracted_gaussian;
        let r = at - self.position;

        primitives.iter().map(|primitive| primitive.evaluate(r)).sum()
    }
}
