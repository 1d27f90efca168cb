use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Prefix of row-group ids
pub const ROW_PREFIX: &str = "row";

/// Prefix of content ids
pub const CELL_PREFIX: &str = "cell";

pub const DEFAULT_ID_LENGTH: usize = 6;
pub const DEFAULT_RETRY_LIMIT: usize = 8;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// 36^12 < 2^64, so one draw yields twelve independent base-36 digits.
const DIGITS_PER_DRAW: usize = 12;

/// Source of randomness for id generation
pub trait EntropySource: fmt::Debug {
    fn next_u64(&mut self) -> u64;
}

/// SplitMix64 stream, fully determined by its seed
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    state: u64,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream seeded from the CRC32 of a document name, so replaying the
    /// same document yields the same ids
    pub fn from_name(name: &str) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(name.as_bytes());
        Self::new(u64::from(hasher.finalize()))
    }
}

impl EntropySource for SeededEntropy {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Entropy seeded from the process hasher keys and the wall clock
#[derive(Debug, Clone)]
pub struct SystemEntropy {
    inner: SeededEntropy,
}

impl SystemEntropy {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(nanos);

        Self {
            inner: SeededEntropy::new(hasher.finish()),
        }
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemEntropy {
    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }
}

/// Generate `<prefix>-<length base-36 chars>` from the given entropy.
///
/// Pure with respect to `entropy`: the same stream state always yields the
/// same id.
pub fn generate_id(prefix: &str, length: usize, entropy: &mut dyn EntropySource) -> String {
    let length = length.max(1);
    let mut id = String::with_capacity(prefix.len() + 1 + length);
    id.push_str(prefix);
    id.push('-');

    let mut bits = 0u64;
    let mut remaining = 0;
    for _ in 0..length {
        if remaining == 0 {
            bits = entropy.next_u64();
            remaining = DIGITS_PER_DRAW;
        }
        id.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
        remaining -= 1;
    }

    id
}

/// Issues row-group and content ids that are unique within one document
#[derive(Debug)]
pub struct IdGenerator {
    entropy: Box<dyn EntropySource>,
    issued: HashSet<String>,
    length: usize,
    retry_limit: usize,
}

impl IdGenerator {
    pub fn new(entropy: Box<dyn EntropySource>) -> Self {
        Self {
            entropy,
            issued: HashSet::new(),
            length: DEFAULT_ID_LENGTH,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    /// Deterministic generator for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(SeededEntropy::new(seed)))
    }

    /// Deterministic generator keyed by a document name
    pub fn for_document(name: &str) -> Self {
        Self::new(Box::new(SeededEntropy::from_name(name)))
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Mark an id found in the document as taken
    pub fn reserve(&mut self, id: impl Into<String>) {
        self.issued.insert(id.into());
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.issued.contains(id)
    }

    pub fn row_id(&mut self) -> String {
        self.fresh(ROW_PREFIX)
    }

    pub fn cell_id(&mut self) -> String {
        self.fresh(CELL_PREFIX)
    }

    /// Generate an id not yet issued or reserved.
    ///
    /// Collisions are regenerated up to the retry limit; after that a numeric
    /// suffix makes the id unique.
    pub fn fresh(&mut self, prefix: &str) -> String {
        for attempt in 0..=self.retry_limit {
            let id = generate_id(prefix, self.length, self.entropy.as_mut());
            if self.issued.insert(id.clone()) {
                return id;
            }
            warn!(id = %id, attempt, "Generated id collided with an existing id");
        }

        let base = generate_id(prefix, self.length, self.entropy.as_mut());
        let mut counter = self.issued.len();
        loop {
            let id = format!("{}-{}", base, counter);
            if self.issued.insert(id.clone()) {
                return id;
            }
            counter += 1;
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Box::new(SystemEntropy::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always returns the same value, forcing collisions
    #[derive(Debug)]
    struct StuckEntropy;

    impl EntropySource for StuckEntropy {
        fn next_u64(&mut self) -> u64 {
            42
        }
    }

    #[test]
    fn test_id_shape() {
        let mut entropy = SeededEntropy::new(7);
        let id = generate_id(ROW_PREFIX, 6, &mut entropy);

        assert!(id.starts_with("row-"));
        assert_eq!(id.len(), 10);
        assert!(id[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_same_seed_same_ids() {
        let mut a = SeededEntropy::new(99);
        let mut b = SeededEntropy::new(99);

        for _ in 0..5 {
            assert_eq!(
                generate_id(CELL_PREFIX, 8, &mut a),
                generate_id(CELL_PREFIX, 8, &mut b)
            );
        }
    }

    #[test]
    fn test_named_generators_are_reproducible() {
        let mut a = IdGenerator::for_document("report.json");
        let mut b = IdGenerator::for_document("report.json");
        let mut c = IdGenerator::for_document("other.json");

        let first = a.row_id();
        assert_eq!(first, b.row_id());
        assert_ne!(first, c.row_id());
    }

    #[test]
    fn test_long_ids_draw_more_entropy() {
        let mut entropy = SeededEntropy::new(3);
        let id = generate_id(CELL_PREFIX, 30, &mut entropy);
        assert_eq!(id.len(), "cell-".len() + 30);
    }

    #[test]
    fn test_generator_avoids_reserved_ids() {
        let mut probe = SeededEntropy::new(11);
        let first = generate_id(ROW_PREFIX, DEFAULT_ID_LENGTH, &mut probe);

        let mut gen = IdGenerator::seeded(11);
        gen.reserve(first.clone());

        let issued = gen.row_id();
        assert_ne!(issued, first);
        assert!(gen.is_taken(&issued));
    }

    #[test]
    fn test_collisions_fall_back_to_suffix() {
        let mut gen = IdGenerator::new(Box::new(StuckEntropy)).with_retry_limit(2);

        let first = gen.cell_id();
        let second = gen.cell_id();
        let third = gen.cell_id();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(second.starts_with(&first));
    }
}
