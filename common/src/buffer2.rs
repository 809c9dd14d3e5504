use std::slice;

/// Row-major 2D buffer: element `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every element in row-major order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let buf = Buffer2::from_fn(3, 2, |x, y| (x, y));
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.pixels()[1], (1, 0));
        assert_eq!(buf.pixels()[3], (0, 1));
        assert_eq!(*buf.get(2, 1), (2, 1));
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn new_rejects_wrong_length() {
        Buffer2::new(2, 2, vec![0u8; 3]);
    }

    #[test]
    fn iter_visits_every_element() {
        let buf = Buffer2::new(2, 2, vec![false, true, false, true]);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.iter().filter(|&&b| b).count(), 2);
    }
}
