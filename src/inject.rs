use std::io;

use thiserror::Error;

/// Something that can push one byte into a terminal's pending input, as if it
/// had been typed on the keyboard.
pub trait InputQueue {
    fn push_byte(&mut self, byte: u8) -> io::Result<()>;
}

impl<Q: InputQueue + ?Sized> InputQueue for &mut Q {
    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).push_byte(byte)
    }
}

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("terminal rejected input at byte {offset}: {source}")]
    Rejected {
        offset: usize,
        #[source]
        source: io::Error,
    },
    #[error("terminal input unavailable: {0}")]
    Unavailable(&'static str),
}

/// Replays `text` into `queue` in order. Stops at the first rejected byte;
/// whatever was delivered before it stays delivered.
pub fn inject<Q: InputQueue>(queue: &mut Q, text: &str) -> Result<(), InjectError> {
    let mut buffer = [0u8; 4];
    let mut offset = 0;
    for ch in text.chars() {
        for &byte in ch.encode_utf8(&mut buffer).as_bytes() {
            queue
                .push_byte(byte)
                .map_err(|source| InjectError::Rejected { offset, source })?;
            offset += 1;
        }
    }
    Ok(())
}

/// The controlling terminal on stdin, fed through `TIOCSTI`.
#[cfg(unix)]
pub struct TtyInputQueue {
    fd: std::os::fd::RawFd,
}

#[cfg(unix)]
impl TtyInputQueue {
    pub fn stdin() -> Result<Self, InjectError> {
        use std::io::IsTerminal;
        use std::os::fd::AsRawFd;

        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(InjectError::Unavailable("stdin is not a terminal"));
        }
        Ok(Self {
            fd: stdin.as_raw_fd(),
        })
    }
}

#[cfg(unix)]
impl InputQueue for TtyInputQueue {
    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        // SAFETY: TIOCSTI reads exactly one byte through the pointer, which
        // stays valid for the duration of the call.
        let rc = unsafe { libc::ioctl(self.fd, libc::TIOCSTI, &byte as *const u8) };
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(unix))]
pub struct TtyInputQueue;

#[cfg(not(unix))]
impl TtyInputQueue {
    pub fn stdin() -> Result<Self, InjectError> {
        Err(InjectError::Unavailable("not supported on this platform"))
    }
}

#[cfg(not(unix))]
impl InputQueue for TtyInputQueue {
    fn push_byte(&mut self, _byte: u8) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}
