//! Private 4x4 symmetric eigen-decomposition for rotation optimization.
//!
//! Implements a Jacobi eigenvalue algorithm for the symmetric 4x4 key matrix
//! of the quaternion rotation optimizer, without requiring an external linear
//! algebra crate.

/// A 4x4 matrix stored in row-major order.
pub(crate) type Matrix4 = [[f64; 4]; 4];

pub(crate) const IDENTITY4: Matrix4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Jacobi eigenvalue algorithm for a 4x4 symmetric matrix.
///
/// Returns (eigenvectors as columns of a matrix, eigenvalues). Eigenvalues
/// are not sorted; `eigenvalues[k]` belongs to column `k` of the eigenvector
/// matrix.
pub(crate) fn jacobi_eigen_4x4(matrix: &Matrix4) -> (Matrix4, [f64; 4]) {
    let mut a = *matrix;
    let mut v = IDENTITY4;

    let max_iter = 100;
    let tol = 1e-15;

    for _ in 0..max_iter {
        // Find the largest off-diagonal element
        let mut max_val = 0.0f64;
        let mut p = 0;
        let mut q = 1;
        for i in 0..4 {
            for j in (i + 1)..4 {
                if a[i][j].abs() > max_val {
                    max_val = a[i][j].abs();
                    p = i;
                    q = j;
                }
            }
        }

        if max_val < tol {
            break;
        }

        // Compute Jacobi rotation angle
        let app = a[p][p];
        let aqq = a[q][q];
        let apq = a[p][q];

        let theta = if (app - aqq).abs() < tol {
            core::f64::consts::FRAC_PI_4
        } else {
            0.5 * (2.0 * apq / (app - aqq)).atan()
        };

        let c = theta.cos();
        let s = theta.sin();

        // Apply Givens rotation: A' = G^T * A * G
        let mut new_a = a;

        for i in 0..4 {
            if i != p && i != q {
                let aip = a[i][p];
                let aiq = a[i][q];
                new_a[i][p] = c * aip + s * aiq;
                new_a[p][i] = new_a[i][p];
                new_a[i][q] = -s * aip + c * aiq;
                new_a[q][i] = new_a[i][q];
            }
        }

        new_a[p][p] = c * c * app + 2.0 * c * s * apq + s * s * aqq;
        new_a[q][q] = s * s * app - 2.0 * c * s * apq + c * c * aqq;
        new_a[p][q] = 0.0;
        new_a[q][p] = 0.0;

        a = new_a;

        // Accumulate rotation into V
        let mut new_v = v;
        for i in 0..4 {
            let vip = v[i][p];
            let viq = v[i][q];
            new_v[i][p] = c * vip + s * viq;
            new_v[i][q] = -s * vip + c * viq;
        }
        v = new_v;
    }

    let eigenvalues = [a[0][0], a[1][1], a[2][2], a[3][3]];
    (v, eigenvalues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        let mut result = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    result[i][j] += a[i][k] * b[k][j];
                }
            }
        }
        result
    }

    fn transpose(m: &Matrix4) -> Matrix4 {
        let mut result = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                result[i][j] = m[j][i];
            }
        }
        result
    }

    #[test]
    fn diagonal_matrix_eigenvalues() {
        let m: Matrix4 = [
            [3.0, 0.0, 0.0, 0.0],
            [0.0, -1.0, 0.0, 0.0],
            [0.0, 0.0, 7.0, 0.0],
            [0.0, 0.0, 0.0, 0.5],
        ];
        let (_, values) = jacobi_eigen_4x4(&m);
        let mut sorted = values;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected = [-1.0, 0.5, 3.0, 7.0];
        for (got, want) in sorted.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn reconstruction() {
        // Symmetric test matrix with distinct eigenvalues
        let m: Matrix4 = [
            [4.0, 1.0, 0.5, 0.0],
            [1.0, 3.0, 0.2, 0.7],
            [0.5, 0.2, 2.0, 0.1],
            [0.0, 0.7, 0.1, 1.0],
        ];
        let (v, values) = jacobi_eigen_4x4(&m);

        // V * diag(values) * V^T should reconstruct M
        let mut vd = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                vd[i][j] = v[i][j] * values[j];
            }
        }
        let reconstructed = multiply(&vd, &transpose(&v));
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (reconstructed[i][j] - m[i][j]).abs() < 1e-9,
                    "reconstruction failed at [{i}][{j}]"
                );
            }
        }
    }

    #[test]
    fn eigenvector_columns_orthonormal() {
        let m: Matrix4 = [
            [2.0, -1.0, 0.0, 0.3],
            [-1.0, 2.0, -1.0, 0.0],
            [0.0, -1.0, 2.0, -1.0],
            [0.3, 0.0, -1.0, 2.0],
        ];
        let (v, _) = jacobi_eigen_4x4(&m);
        let vtv = multiply(&transpose(&v), &v);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (vtv[i][j] - expected).abs() < 1e-10,
                    "V^T V not identity at [{i}][{j}]"
                );
            }
        }
    }
}
