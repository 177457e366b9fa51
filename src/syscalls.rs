//! Syscall vocabulary for next-call prediction
//!
//! The vocabulary is fixed for the process lifetime: it defines both the
//! one-hot encoding basis and the classifier's output label space.

/// Ordered prediction vocabulary. Index order matters: labels, one-hot
/// blocks, and probability vectors are all aligned to it.
pub const SYSCALLS: [&str; 8] = [
    "read", "write", "open", "close", "stat", "mmap", "fork", "exec",
];

/// Number of recent syscalls considered when predicting the next one.
pub const HISTORY_LEN: usize = 6;

/// Resolve a syscall name to its vocabulary index
///
/// Returns `None` for names outside the vocabulary (including the empty
/// padding marker); callers treat that as an all-zero one-hot block.
pub fn syscall_index(name: &str) -> Option<usize> {
    SYSCALLS.iter().position(|&s| s == name)
}

/// Vocabulary as owned strings, for JSON response payloads.
pub fn vocabulary() -> Vec<String> {
    SYSCALLS.iter().map(|s| s.to_string()).collect()
}
