//! The character I/O seam the core depends on, so the dispatcher never
//! touches `Stdin`/`Stdout` directly. The CLI crate supplies the concrete
//! terminal-backed implementation.

use std::io;

/// One byte of input or output through the memory-mapped port at `MASK`.
pub trait CharIo {
    /// Reads one byte, blocking until it is available. Returns `Err` on EOF
    /// or any I/O failure; the dispatcher treats both as a fatal halt.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Writes one byte. Returns `Err` on any I/O failure.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// An I/O channel with canned input and a capturing output buffer, used by
/// tests and by the end-to-end scenarios in the optimizer/machine test
/// suites.
#[derive(Default)]
pub struct BufferIo {
    input: std::collections::VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferIo {
    pub fn with_input(input: &[u8]) -> BufferIo {
        BufferIo {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl CharIo for BufferIo {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}
