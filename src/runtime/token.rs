//! Operation tracking for pooled async-I/O contexts.
//!
//! A context records which kind of operation it is serving and where that
//! operation stands, so a completion can be correlated with the borrower
//! that started it.

use std::io;

/// Type of in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    /// Accept operation on a listener socket.
    Accept,
    /// Read from a connection into the context buffer.
    Receive,
    /// Write the context buffer to a connection.
    Send,
}

/// Completion state of the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No operation has been started since the last reset.
    Idle,
    /// Operation submitted, result not yet known.
    Pending,
    /// Operation finished, moving `bytes` bytes.
    Completed {
        /// Bytes transferred by this operation.
        bytes: usize,
    },
    /// Operation failed.
    Failed(io::ErrorKind),
}

impl Completion {
    /// Build a completion from an I/O result.
    pub fn from_result(result: &io::Result<usize>) -> Self {
        match result {
            Ok(bytes) => Completion::Completed { bytes: *bytes },
            Err(e) => Completion::Failed(e.kind()),
        }
    }

    /// Whether the operation has a final result.
    pub fn is_done(&self) -> bool {
        matches!(self, Completion::Completed { .. } | Completion::Failed(_))
    }
}
