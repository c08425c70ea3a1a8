use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::io;
use std::path::Path;

/// One observed user/item interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user: usize,
    pub item: usize,
    pub rating: f32,
}

/// A set of interactions together with the user/item counts the model
/// tables are sized from.
#[derive(Debug, Clone)]
pub struct Interactions {
    samples: Vec<Interaction>,
    num_users: usize,
    num_items: usize,
}

impl Interactions {
    /// Build from samples, deriving counts as `max id + 1`.
    pub fn new(samples: Vec<Interaction>) -> Self {
        let num_users = samples.iter().map(|s| s.user + 1).max().unwrap_or(0);
        let num_items = samples.iter().map(|s| s.item + 1).max().unwrap_or(0);
        Self {
            samples,
            num_users,
            num_items,
        }
    }

    /// Build with explicit counts.  Every id must lie within range.
    pub fn with_counts(samples: Vec<Interaction>, num_users: usize, num_items: usize) -> Self {
        for s in &samples {
            assert!(s.user < num_users, "user id out of range");
            assert!(s.item < num_items, "item id out of range");
        }
        Self {
            samples,
            num_users,
            num_items,
        }
    }

    /// Load `user_id,item_id[,rating]` rows from a CSV file.  A missing
    /// rating column defaults to 1.0 (implicit feedback).  Malformed rows
    /// are an error.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path.as_ref())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let mut samples = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if record.len() < 2 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("expected at least user,item fields, got {} fields", record.len()),
                ));
            }
            let parse_id = |field: &str| {
                field.parse::<usize>().map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("bad id {field:?}: {e}"))
                })
            };
            let user = parse_id(&record[0])?;
            let item = parse_id(&record[1])?;
            let rating = match record.get(2) {
                Some(f) if !f.is_empty() => f.parse::<f32>().map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("bad rating {f:?}: {e}"))
                })?,
                _ => 1.0,
            };
            samples.push(Interaction { user, item, rating });
        }
        Ok(Interactions::new(samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_users(&self) -> usize {
        self.num_users
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn samples(&self) -> &[Interaction] {
        &self.samples
    }

    /// Random train/validation split.  Both halves keep the full counts so
    /// models sized from either see the same id space.
    pub fn split(mut self, val_fraction: f32, rng: &mut StdRng) -> (Interactions, Interactions) {
        assert!((0.0..=1.0).contains(&val_fraction));
        self.samples.shuffle(rng);
        let val_len = (self.samples.len() as f32 * val_fraction).round() as usize;
        let val = self.samples.split_off(self.samples.len() - val_len);
        let train = Interactions::with_counts(self.samples, self.num_users, self.num_items);
        let val = Interactions::with_counts(val, self.num_users, self.num_items);
        (train, val)
    }
}
