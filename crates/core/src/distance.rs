use ndarray::Array1;

/// A distance between two result values of the same type.
///
/// The batch check compares batched and single-element results through this
/// trait, which lets it handle plain vectors and structured outputs alike.
/// Implementations must return a non-negative value that is zero for equal
/// arguments.
pub trait Distance {
    fn distance(&self, other: &Self) -> f64;
}

impl Distance for f64 {
    fn distance(&self, other: &Self) -> f64 {
        (self - other).abs()
    }
}

impl Distance for f32 {
    fn distance(&self, other: &Self) -> f64 {
        f64::from((self - other).abs())
    }
}

macro_rules! unsigned_distance {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Distance for $ty {
                #[allow(clippy::cast_precision_loss)]
                fn distance(&self, other: &Self) -> f64 {
                    self.abs_diff(*other) as f64
                }
            }
        )+
    };
}

unsigned_distance!(u8, u16, u32, u64, usize);

/// Euclidean distance, or infinity if the lengths differ.
impl Distance for Array1<f64> {
    fn distance(&self, other: &Self) -> f64 {
        euclidean(self.iter().copied(), other.iter().copied(), self.len(), other.len())
    }
}

/// Euclidean distance, or infinity if the lengths differ.
impl Distance for Vec<f64> {
    fn distance(&self, other: &Self) -> f64 {
        euclidean(self.iter().copied(), other.iter().copied(), self.len(), other.len())
    }
}

fn euclidean(
    a: impl Iterator<Item = f64>,
    b: impl Iterator<Item = f64>,
    a_len: usize,
    b_len: usize,
) -> f64 {
    if a_len != b_len {
        return f64::INFINITY;
    }
    a.zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}
