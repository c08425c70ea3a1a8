use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Batching iterator over owned samples with optional shuffling.
///
/// Construct one per epoch; shuffling permutes the samples once at
/// construction time.  The final batch may be shorter than `batch_size`.
pub struct DataLoader<T: Clone> {
    data: Vec<T>,
    batch_size: usize,
    index: usize,
}

impl<T: Clone> DataLoader<T> {
    pub fn new(mut data: Vec<T>, batch_size: usize, shuffle: bool, rng: &mut StdRng) -> Self {
        assert!(batch_size > 0);
        if shuffle {
            data.shuffle(rng);
        }
        Self {
            data,
            batch_size,
            index: 0,
        }
    }
}

impl<T: Clone> Iterator for DataLoader<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.data.len() {
            return None;
        }
        let end = (self.index + self.batch_size).min(self.data.len());
        let batch = self.data[self.index..end].to_vec();
        self.index = end;
        Some(batch)
    }
}
