/// Periodic cell. Rows of `matrix` are the lattice vectors a, b and c in Angstrom.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    matrix: [[f64; 3]; 3],
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

impl Lattice {
    pub fn new(matrix: [[f64; 3]; 3]) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.matrix
    }

    /// Signed cell volume, `a . (b x c)`.
    pub fn determinant(&self) -> f64 {
        let [a, b, c] = &self.matrix;
        dot(a, &cross(b, c))
    }

    pub fn volume(&self) -> f64 {
        self.determinant().abs()
    }

    pub fn lengths(&self) -> [f64; 3] {
        [
            norm(&self.matrix[0]),
            norm(&self.matrix[1]),
            norm(&self.matrix[2]),
        ]
    }

    /// Distances between opposite faces of the cell along each lattice direction.
    pub fn plane_spacings(&self) -> [f64; 3] {
        let [a, b, c] = &self.matrix;
        let volume = self.volume();
        [
            volume / norm(&cross(b, c)),
            volume / norm(&cross(c, a)),
            volume / norm(&cross(a, b)),
        ]
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            for value in row.iter_mut() {
                *value *= factor;
            }
        }
        Self { matrix }
    }

    pub fn to_cartesian(&self, frac: &[f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// Solves `cart = frac . M` via the reciprocal vectors. `None` for a singular cell.
    pub fn to_fractional(&self, cart: &[f64; 3]) -> Option<[f64; 3]> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let [a, b, c] = &self.matrix;
        let ra = cross(b, c);
        let rb = cross(c, a);
        let rc = cross(a, b);
        Some([dot(cart, &ra) / det, dot(cart, &rb) / det, dot(cart, &rc) / det])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cubic_cell() {
        let lattice = Lattice::new([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]]);
        assert!(approx(lattice.volume(), 24.0));
        assert_eq!(lattice.lengths(), [2.0, 3.0, 4.0]);
        let spacings = lattice.plane_spacings();
        assert!(approx(spacings[0], 2.0) && approx(spacings[1], 3.0) && approx(spacings[2], 4.0));
    }

    #[test]
    fn test_fractional_cartesian_inverse() {
        let lattice = Lattice::new([[3.0, 0.0, 0.0], [1.5, 2.6, 0.0], [0.3, 0.4, 5.0]]);
        let frac = [0.25, 0.5, 0.75];
        let cart = lattice.to_cartesian(&frac);
        let back = lattice.to_fractional(&cart).unwrap();
        for i in 0..3 {
            assert!(approx(frac[i], back[i]));
        }
    }

    #[test]
    fn test_singular_cell_has_no_inverse() {
        let lattice = Lattice::new([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(lattice.to_fractional(&[0.1, 0.2, 0.3]).is_none());
    }
}
