use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dimensions of a 3D tensor: `depth` feature maps of `height × width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub const fn new(depth: usize, height: usize, width: usize) -> Shape {
        Shape { depth, height, width }
    }

    /// A `len × 1 × 1` shape, the natural shape of a dense layer's output.
    pub const fn vector(len: usize) -> Shape {
        Shape { depth: len, height: 1, width: 1 }
    }

    pub fn len(&self) -> usize {
        self.depth * self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset of `(d, row, col)` in depth-major order.
    #[inline]
    pub fn offset(&self, d: usize, row: usize, col: usize) -> usize {
        (d * self.height + row) * self.width + col
    }

    pub fn map_len(&self) -> usize {
        self.height * self.width
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.depth, self.height, self.width)
    }
}

/// A depth-indexed stack of 2D feature maps.
///
/// The maps are stored back to back in one buffer; `feature_map(d)` yields
/// map `d` as a row-major slice. The shape never changes after allocation,
/// values are overwritten in place by forward and backward passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: Shape) -> Tensor {
        Tensor { shape, data: vec![0.0; shape.len()] }
    }

    /// Wraps `data` as a tensor of `shape`. Returns `None` when the lengths
    /// disagree.
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Option<Tensor> {
        (data.len() == shape.len()).then_some(Tensor { shape, data })
    }

    /// Builds a tensor from one `rows × cols` matrix per depth slice.
    /// All maps must have the same dimensions.
    pub fn from_maps(maps: Vec<Vec<Vec<f64>>>) -> Option<Tensor> {
        let depth = maps.len();
        let height = maps.first().map_or(0, |m| m.len());
        let width = maps
            .first()
            .and_then(|m| m.first())
            .map_or(0, |row| row.len());
        let shape = Shape::new(depth, height, width);
        let mut data = Vec::with_capacity(shape.len());
        for map in maps {
            if map.len() != height {
                return None;
            }
            for row in map {
                if row.len() != width {
                    return None;
                }
                data.extend(row);
            }
        }
        Some(Tensor { shape, data })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn feature_map(&self, d: usize) -> &[f64] {
        let n = self.shape.map_len();
        &self.data[d * n..(d + 1) * n]
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    pub fn copy_from(&mut self, other: &Tensor) {
        debug_assert_eq!(self.shape, other.shape);
        self.data.copy_from_slice(&other.data);
    }

}

impl Index<(usize, usize, usize)> for Tensor {
    type Output = f64;

    fn index(&self, (d, row, col): (usize, usize, usize)) -> &f64 {
        &self.data[self.shape.offset(d, row, col)]
    }
}

impl IndexMut<(usize, usize, usize)> for Tensor {
    fn index_mut(&mut self, (d, row, col): (usize, usize, usize)) -> &mut f64 {
        let at = self.shape.offset(d, row, col);
        &mut self.data[at]
    }
}

impl From<Vec<f64>> for Tensor {
    /// A plain vector becomes a `len × 1 × 1` tensor.
    fn from(data: Vec<f64>) -> Tensor {
        Tensor { shape: Shape::vector(data.len()), data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_maps_is_depth_major() {
        let t = Tensor::from_maps(vec![
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0], vec![7.0, 8.0]],
        ])
        .unwrap();
        assert_eq!(t.shape(), Shape::new(2, 2, 2));
        assert_eq!(t[(1, 0, 1)], 6.0);
        assert_eq!(t.feature_map(1), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn ragged_maps_are_rejected() {
        assert!(Tensor::from_maps(vec![vec![vec![1.0, 2.0], vec![3.0]]]).is_none());
        assert!(Tensor::from_vec(Shape::new(1, 2, 2), vec![0.0; 3]).is_none());
    }
}
