//! One-hot history encoding
//!
//! Maps a bounded history of syscall names into the fixed-length feature
//! vector consumed by the classifier. Only the last [`HISTORY_LEN`] entries
//! matter; shorter histories are left-padded with an empty marker that
//! encodes to an all-zero block. Unknown names also encode to all-zero
//! blocks without raising an error (the contract is silently lossy).

use crate::syscalls::{syscall_index, HISTORY_LEN, SYSCALLS};

/// Length of every feature vector: one one-hot block per history slot.
pub const FEATURE_LEN: usize = HISTORY_LEN * SYSCALLS.len();

/// Encode a syscall history into a flattened one-hot feature vector
///
/// Output ordering is slot-major (oldest slot first), vocabulary-minor.
/// The result always has length [`FEATURE_LEN`].
pub fn encode_history<S: AsRef<str>>(history: &[S]) -> Vec<f64> {
    let mut flat = vec![0.0; FEATURE_LEN];

    let tail_len = history.len().min(HISTORY_LEN);
    let tail = &history[history.len() - tail_len..];
    let pad = HISTORY_LEN - tail_len;

    for (slot, name) in tail.iter().enumerate() {
        if let Some(idx) = syscall_index(name.as_ref()) {
            flat[(pad + slot) * SYSCALLS.len() + idx] = 1.0;
        }
    }

    flat
}
