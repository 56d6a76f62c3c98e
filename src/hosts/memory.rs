//! In-memory hosts file for tests.
//!
//! Every handle shares one buffer but keeps its own cursor, the way separate
//! opens of the same file on disk do.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{HostsHandle, HostsStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryHostsStore {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryHostsStore {
    pub fn new(initial: &str) -> Self {
        Self {
            buf: Arc::new(Mutex::new(initial.as_bytes().to_vec())),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl HostsStore for MemoryHostsStore {
    type Handle = MemoryHandle;

    fn open(&self) -> io::Result<MemoryHandle> {
        Ok(MemoryHandle {
            buf: Arc::clone(&self.buf),
            pos: 0,
        })
    }
}

pub struct MemoryHandle {
    buf: Arc<Mutex<Vec<u8>>>,
    pos: u64,
}

impl MemoryHandle {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Read for MemoryHandle {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = {
            let buf = self.lock();
            let start = (self.pos as usize).min(buf.len());
            let n = out.len().min(buf.len() - start);
            out[..n].copy_from_slice(&buf[start..start + n]);
            n
        };
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemoryHandle {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        {
            let mut buf = self.lock();
            let start = self.pos as usize;
            let end = start + data.len();
            if buf.len() < end {
                buf.resize(end, 0);
            }
            buf[start..end].copy_from_slice(data);
        }
        self.pos += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryHandle {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let len = self.lock().len() as i64;
        let target = match from {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(off) => len + off,
            SeekFrom::Current(off) => self.pos as i64 + off,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl HostsHandle for MemoryHandle {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.lock().resize(len as usize, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_contents_but_not_cursors() {
        let store = MemoryHostsStore::new("abc");
        let mut a = store.open().unwrap();
        let mut b = store.open().unwrap();

        a.seek(SeekFrom::End(0)).unwrap();
        a.write_all(b"def").unwrap();

        let mut seen = String::new();
        b.read_to_string(&mut seen).unwrap();
        assert_eq!(seen, "abcdef");

        b.seek(SeekFrom::Start(0)).unwrap();
        b.write_all(b"x").unwrap();
        b.truncate_to(1).unwrap();
        assert_eq!(store.contents(), "x");
    }
}
