//! Synthetic sequence generation
//!
//! Produces labeled training examples by sampling a hand-authored
//! probabilistic grammar over the syscall vocabulary: a weighted-choice
//! table biased toward `read`/`write`, a residual uniform draw over the
//! full vocabulary, and occasional bursts of clustered `read`s. The RNG is
//! seeded with a fixed constant so identical `(num_seq, seq_len)` calls
//! reproduce identical training sets; that determinism is the governing
//! correctness property here.

use crate::encoder::encode_history;
use crate::syscalls::{syscall_index, HISTORY_LEN, SYSCALLS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Fixed generator seed, matching the reference data distribution.
const GENERATOR_SEED: u64 = 123;

/// A generated training set: feature matrix plus aligned label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// One encoded history window per example
    pub features: Vec<Vec<f64>>,
    /// Vocabulary index of the syscall following each window
    pub labels: Vec<usize>,
}

impl TrainingSet {
    /// Number of training examples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no windows were produced (e.g. sequences shorter than
    /// the history length plus one)
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Generate `num_seq` synthetic sequences of `seq_len` syscalls and slide
/// a history window across each to produce training examples.
pub fn generate_sequences(num_seq: usize, seq_len: usize) -> TrainingSet {
    let mut rng = StdRng::seed_from_u64(GENERATOR_SEED);
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for _ in 0..num_seq {
        let seq = sample_sequence(&mut rng, seq_len);

        // Sliding windows: a full window must be followed by one more
        // event to supply the label
        for i in 0..seq.len().saturating_sub(HISTORY_LEN).max(1) {
            if i + HISTORY_LEN < seq.len() {
                features.push(encode_history(&seq[i..i + HISTORY_LEN]));
                let next = seq[i + HISTORY_LEN];
                labels.push(syscall_index(next).unwrap_or(0));
            }
        }
    }

    TrainingSet { features, labels }
}

/// Sample a single sequence from the weighted grammar.
fn sample_sequence(rng: &mut StdRng, seq_len: usize) -> Vec<&'static str> {
    let mut seq: Vec<&'static str> = Vec::with_capacity(seq_len);

    while seq.len() < seq_len {
        let r: f64 = rng.gen();
        let call = if r < 0.28 {
            "read"
        } else if r < 0.48 {
            "write"
        } else if r < 0.56 {
            "open"
        } else if r < 0.62 {
            "stat"
        } else {
            SYSCALLS.choose(rng).copied().unwrap_or("read")
        };
        seq.push(call);

        // Inject occasional clusters of reads
        if rng.gen::<f64>() < 0.12 && seq.last() == Some(&"read") {
            let extra = rng.gen_range(1..3);
            for _ in 0..extra {
                seq.push("read");
            }
        }
    }

    seq.truncate(seq_len);
    seq
}
