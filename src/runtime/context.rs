//! Reusable async-I/O operation context.
//!
//! An `AsyncContext` bundles everything one socket operation needs: an I/O
//! buffer, the operation kind and its completion state, transfer counters,
//! and the endpoint it is bound to. Contexts are borrowed from an
//! `AsyncContextPool`, used for a single read or write, and handed back.
//!
//! ## Lifecycle
//!
//! ```text
//! acquire -> start(op) -> complete(result) -> reset -> release
//!                                                   \-> dispose (pool full)
//! ```
//!
//! Disposal consumes the context, so a disposed context cannot be reused.

use bytes::BytesMut;
use socket2::Socket;
use std::io;
use std::net::{Shutdown, SocketAddr};
use tracing::{debug, trace, warn};

use super::token::{Completion, OpType};

/// State for one in-flight or idle socket operation.
#[derive(Debug)]
pub struct AsyncContext {
    /// I/O buffer. Capacity is fixed at creation and kept across resets.
    buffer: BytesMut,
    /// Capacity requested at creation.
    buffer_size: usize,
    /// Operation currently associated with this context.
    op: Option<OpType>,
    /// Where that operation stands.
    completion: Completion,
    /// Start offset into the buffer for the next transfer.
    offset: usize,
    /// Total bytes moved since the last reset.
    transferred: usize,
    /// Caller-defined correlation token.
    user_token: Option<u64>,
    /// Remote endpoint of the associated connection.
    remote: Option<SocketAddr>,
    /// Socket owned by this context, e.g. the result of an accept.
    socket: Option<Socket>,
}

impl AsyncContext {
    /// Create a context with a buffer of `buffer_size` bytes capacity.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(buffer_size),
            buffer_size,
            op: None,
            completion: Completion::Idle,
            offset: 0,
            transferred: 0,
            user_token: None,
            remote: None,
            socket: None,
        }
    }

    /// Buffer contents.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Mutable access to the buffer, e.g. to encode a packet into it.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Buffer capacity requested at creation.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Bytes of the buffer not yet transferred, starting at the offset.
    pub fn pending_bytes(&self) -> &[u8] {
        let start = self.offset.min(self.buffer.len());
        &self.buffer[start..]
    }

    /// Mark the start of an operation.
    pub fn start(&mut self, op: OpType) {
        self.op = Some(op);
        self.completion = Completion::Pending;
    }

    /// Record the result of the current operation.
    ///
    /// Successful transfers advance the offset and the transferred counter.
    pub fn complete(&mut self, result: io::Result<usize>) {
        self.completion = Completion::from_result(&result);
        if let Ok(n) = result {
            self.offset += n;
            self.transferred += n;
        }
    }

    /// Operation currently associated with this context.
    pub fn op(&self) -> Option<OpType> {
        self.op
    }

    /// Completion state of the current operation.
    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Current buffer offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Set the buffer offset for the next transfer.
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Total bytes moved since the last reset.
    pub fn bytes_transferred(&self) -> usize {
        self.transferred
    }

    pub fn user_token(&self) -> Option<u64> {
        self.user_token
    }

    pub fn set_user_token(&mut self, token: u64) {
        self.user_token = Some(token);
    }

    /// Remote endpoint of the associated connection.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// Associate this context with a remote endpoint.
    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote = Some(addr);
    }

    /// Hand a socket to this context, e.g. the connection produced by an accept.
    pub fn attach(&mut self, socket: Socket) {
        self.socket = Some(socket);
    }

    /// Socket owned by this context, if any.
    pub fn socket(&self) -> Option<&Socket> {
        self.socket.as_ref()
    }

    /// Take the socket out of the context.
    pub fn detach(&mut self) -> Option<Socket> {
        self.socket.take()
    }

    /// Clear per-operation state so the context can serve another operation.
    ///
    /// The buffer is emptied but keeps its allocation. A socket still
    /// attached at this point is shut down and closed, as in `dispose`;
    /// call `detach` first to keep the connection.
    pub fn reset(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!(remote = ?self.remote, "Closing socket still attached at reset");
            if let Err(e) = close_socket(socket) {
                warn!(error = %e, "Failed to shut down socket at reset");
            }
        }

        self.buffer.clear();
        if self.buffer.capacity() < self.buffer_size {
            self.buffer.reserve(self.buffer_size);
        }
        self.op = None;
        self.completion = Completion::Idle;
        self.offset = 0;
        self.transferred = 0;
        self.user_token = None;
        self.remote = None;
    }

    /// Release the context's resources.
    ///
    /// An attached socket is shut down before it is closed; a socket that
    /// was never connected is not an error.
    pub fn dispose(mut self) -> io::Result<()> {
        if let Some(socket) = self.socket.take() {
            close_socket(socket)?;
        }
        trace!(buffer_size = self.buffer_size, "Disposed async context");
        Ok(())
    }
}

/// Shut a socket down in both directions, then drop it.
fn close_socket(socket: Socket) -> io::Result<()> {
    match socket.shutdown(Shutdown::Both) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        Err(e) => Err(e),
    }
}
