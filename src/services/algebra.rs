use crate::environment::ProcessGroup;
use crate::services::{DenseAlgebra, ServiceError, Transpose};
use crate::utils::array_helper::parallel_matrix_multiply;
use anyhow::Result;
use log::trace;
use ndarray::prelude::*;

/// Dense matrix algebra that distributes the rows of every product over the members of
/// the process group.
#[derive(Clone, Debug)]
pub struct GroupAlgebra {
    pub group: ProcessGroup,
}

impl GroupAlgebra {
    pub fn new(group: ProcessGroup) -> Self {
        Self { group }
    }
}

impl DenseAlgebra for GroupAlgebra {
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: ArrayView2<f64>,
        b: ArrayView2<f64>,
        beta: f64,
        c: &mut Array2<f64>,
    ) -> Result<()> {
        let op_a: ArrayView2<f64> = trans_a.apply(a);
        let op_b: ArrayView2<f64> = trans_b.apply(b);
        if op_a.ncols() != op_b.nrows() || c.dim() != (op_a.nrows(), op_b.ncols()) {
            return Err(ServiceError::new(
                "gemm",
                format!(
                    "shapes do not match: op(A) {:?}, op(B) {:?}, C {:?}",
                    op_a.dim(),
                    op_b.dim(),
                    c.dim()
                ),
            )
            .into());
        }
        trace!(
            "gemm {:?} x {:?} on {} member(s) of {}",
            op_a.dim(),
            op_b.dim(),
            self.group.size,
            self.group.name
        );
        let product: Array2<f64> = parallel_matrix_multiply(op_a, op_b, self.group.size);
        if beta == 0.0 {
            c.assign(&(alpha * &product));
        } else {
            c.zip_mut_with(&product, |ci, pi| *ci = alpha * pi + beta * *ci);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;

    #[test]
    fn gemm_with_transposes() {
        let algebra = GroupAlgebra::new(ProcessGroup::new("test", 2));
        let a: Array2<f64> = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let b: Array2<f64> = array![[1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
        let mut c: Array2<f64> = Array2::zeros((3, 3));
        algebra
            .gemm(Transpose::No, Transpose::No, 1.0, a.view(), b.view(), 0.0, &mut c)
            .unwrap();
        assert!(c.abs_diff_eq(&a.dot(&b), 1e-14));

        let mut ct: Array2<f64> = Array2::ones((2, 2));
        algebra
            .gemm(Transpose::Yes, Transpose::Yes, 2.0, a.view(), a.t(), 1.0, &mut ct)
            .unwrap();
        let expected: Array2<f64> = 2.0 * a.t().dot(&a) + 1.0;
        assert!(ct.abs_diff_eq(&expected, 1e-14));
    }

    #[test]
    fn zero_beta_overwrites_nan() {
        let algebra = GroupAlgebra::new(ProcessGroup::new("test", 1));
        let a: Array2<f64> = Array2::eye(2);
        let mut c: Array2<f64> = Array2::from_elem((2, 2), f64::NAN);
        algebra
            .gemm(Transpose::No, Transpose::Yes, 1.0, a.view(), a.view(), 0.0, &mut c)
            .unwrap();
        assert!(c.abs_diff_eq(&a, 1e-15));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let algebra = GroupAlgebra::new(ProcessGroup::new("test", 1));
        let a: Array2<f64> = Array2::zeros((2, 3));
        let mut c: Array2<f64> = Array2::zeros((2, 2));
        let err = algebra
            .gemm(Transpose::No, Transpose::No, 1.0, a.view(), a.view(), 0.0, &mut c)
            .unwrap_err();
        assert!(err.downcast_ref::<ServiceError>().is_some());
    }
}
