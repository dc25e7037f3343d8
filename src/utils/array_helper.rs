use ndarray::prelude::*;
use rayon::prelude::*;

/// Product a·b where the rows of a (and of the result) are split into `blocks` chunks
/// that are multiplied in parallel.
pub fn parallel_matrix_multiply(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
    blocks: usize,
) -> Array2<f64> {
    let f_0: usize = a.dim().0;
    let f_1: usize = b.dim().1;
    let mut arr: Array2<f64> = Array2::zeros((f_0, f_1));
    if f_0 == 0 || f_1 == 0 {
        return arr;
    }
    let blocks: usize = blocks.max(1);
    let size: usize = (f_0 + blocks - 1) / blocks;

    arr.axis_chunks_iter_mut(Axis(0), size)
        .into_par_iter()
        .zip(a.axis_chunks_iter(Axis(0), size).into_par_iter())
        .for_each(|(mut rows, rows_a)| {
            rows.assign(&rows_a.dot(&b));
        });

    arr
}
