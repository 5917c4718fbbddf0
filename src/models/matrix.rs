/// Compact bit matrix for binary images (true = dark/foreground)
#[derive(Debug, Clone)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// Create a new all-clear matrix with the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let word_count = (width * height).div_ceil(64);
        Self {
            width,
            height,
            words: vec![0; word_count],
        }
    }

    /// Matrix width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Matrix height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y); out-of-bounds reads as clear
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bit = y * self.width + x;
        (self.words[bit / 64] >> (bit % 64)) & 1 == 1
    }

    /// Set bit at (x, y); out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bit = y * self.width + x;
        let mask = 1u64 << (bit % 64);
        if value {
            self.words[bit / 64] |= mask;
        } else {
            self.words[bit / 64] &= !mask;
        }
    }

    /// Count set bits in the whole matrix
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
