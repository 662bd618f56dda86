//! The stdin/stdout-backed [`CharIo`] implementation. `Stdin`/`Stdout`'s
//! `read`/`write` already retry on `Interrupted` internally, so no explicit
//! EINTR loop is needed here; see `subleq::io::CharIo` for the seam this
//! fills.

use std::io::{self, IsTerminal, Read, Write};

use subleq::CharIo;

pub struct TerminalIo {
    stdin: io::Stdin,
    stdout: io::Stdout,
    stdout_is_tty: bool,
}

impl TerminalIo {
    pub fn new() -> TerminalIo {
        let stdout = io::stdout();
        let stdout_is_tty = stdout.is_terminal();
        TerminalIo {
            stdin: io::stdin(),
            stdout,
            stdout_is_tty,
        }
    }
}

impl Default for TerminalIo {
    fn default() -> TerminalIo {
        TerminalIo::new()
    }
}

impl CharIo for TerminalIo {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        let mut lock = self.stdin.lock();
        match lock.read(&mut byte)? {
            1 => Ok(byte[0]),
            _ => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input")),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let mut lock = self.stdout.lock();
        lock.write_all(&[byte])?;
        if self.stdout_is_tty {
            lock.flush()?;
        }
        Ok(())
    }
}
