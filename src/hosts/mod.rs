//! Hosts file reconciliation.
//!
//! A reconcile is one read-modify-write cycle against the hosts file:
//! open it for reading and writing, keep every line that is not an entry
//! for the hostname, append `"<address> <hostname>"`, rewind, rewrite and
//! truncate to the new length.  Lines that do not name the hostname are kept
//! byte for byte and in their original order, whatever their encoding.
//!
//! The cycle is split into [`begin`] (open and scan) and
//! [`PendingRewrite::commit`] (rewrite and truncate).  Two cycles against the
//! same file that both scan before either commits lose one of the two
//! entries, so callers running reconciles concurrently must route them
//! through a [`writer::HostsWriter`].

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::net::IpAddr;
use std::path::PathBuf;

use log::debug;

use crate::error::HostsError;

#[cfg(test)]
pub mod memory;
pub mod writer;

/// An open hosts file supporting a full read-modify-write cycle.
pub trait HostsHandle: Read + Write + Seek + Send {
    /// Cut the file to exactly `len` bytes.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl HostsHandle for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Where the hosts file lives.
pub trait HostsStore: Send + Sync + 'static {
    type Handle: HostsHandle;

    /// Open for combined read and write, without truncating.
    fn open(&self) -> io::Result<Self::Handle>;
}

/// The hosts file on disk, `/etc/hosts` by default.
#[derive(Debug, Clone)]
pub struct FileHostsStore {
    path: PathBuf,
}

impl FileHostsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HostsStore for FileHostsStore {
    type Handle = File;

    fn open(&self) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(&self.path)
    }
}

/// What a reconcile for one hostname does with an existing line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineFate {
    Keep,
    Drop,
    /// The hostname was an alias on a line that still names other hosts.
    Rewrite(Vec<u8>),
}

fn fields(record: &[u8]) -> impl Iterator<Item = &[u8]> {
    record
        .split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty())
}

/// Decide what happens to `line` when reconciling `hostname`.
///
/// Lines are compared as bytes and only whole fields match, so `minion-1`
/// never claims a line for `minion-10`.  A line whose leading field is the
/// hostname is dropped.  Otherwise the hostname is removed from the line's
/// name fields and the line is dropped once no names are left.  Text after
/// `#` is never looked at, and lines that do not name the hostname are kept
/// byte for byte.
pub fn line_fate(line: &[u8], hostname: &str) -> LineFate {
    let host = hostname.as_bytes();
    let (record, comment) = match line.iter().position(|&b| b == b'#') {
        Some(at) => line.split_at(at),
        None => (line, &[][..]),
    };

    let mut tokens = fields(record);
    let leading = match tokens.next() {
        Some(leading) => leading,
        None => return LineFate::Keep,
    };
    if leading == host {
        return LineFate::Drop;
    }

    let names: Vec<&[u8]> = tokens.collect();
    if !names.contains(&host) {
        return LineFate::Keep;
    }
    let remaining: Vec<&[u8]> = names.into_iter().filter(|name| *name != host).collect();
    if remaining.is_empty() {
        return LineFate::Drop;
    }

    let mut rewritten = leading.to_vec();
    for name in remaining {
        rewritten.push(b' ');
        rewritten.extend_from_slice(name);
    }
    if !comment.is_empty() {
        rewritten.push(b' ');
        rewritten.extend_from_slice(comment);
    }
    LineFate::Rewrite(rewritten)
}

/// Whether reconciling `hostname` touches `line` at all.
#[cfg(test)]
pub fn is_entry_for(line: &str, hostname: &str) -> bool {
    line_fate(line.as_bytes(), hostname) != LineFate::Keep
}

/// Render the new file contents: `kept` lines followed by the entry, each
/// terminated by `\n`.
pub fn render(kept: &[Vec<u8>], address: IpAddr, hostname: &str) -> Vec<u8> {
    let mut content = Vec::new();
    for line in kept {
        content.extend_from_slice(line);
        content.push(b'\n');
    }
    content.extend_from_slice(format!("{} {}\n", address, hostname).as_bytes());
    content
}

/// A scanned hosts file waiting for its rewrite.
pub struct PendingRewrite<H: HostsHandle> {
    handle: H,
    hostname: String,
    kept: Vec<Vec<u8>>,
}

/// Open the hosts file and read every line not owned by `hostname`.
pub fn begin<S: HostsStore>(
    store: &S,
    hostname: &str,
) -> Result<PendingRewrite<S::Handle>, HostsError> {
    let mut handle = store.open().map_err(|source| HostsError::Open {
        hostname: hostname.to_string(),
        source,
    })?;

    let mut kept = Vec::new();
    let mut reader = BufReader::new(&mut handle);
    loop {
        let mut line = Vec::new();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| HostsError::Scan {
                hostname: hostname.to_string(),
                source,
            })?;
        if n == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }

        match line_fate(&line, hostname) {
            LineFate::Keep => kept.push(line),
            LineFate::Drop => {
                debug!(
                    "Dropping stale entry for {}: {}",
                    hostname,
                    String::from_utf8_lossy(&line)
                );
            }
            LineFate::Rewrite(rewritten) => {
                debug!(
                    "Removing alias {} from: {}",
                    hostname,
                    String::from_utf8_lossy(&line)
                );
                kept.push(rewritten);
            }
        }
    }
    drop(reader);

    Ok(PendingRewrite {
        handle,
        hostname: hostname.to_string(),
        kept,
    })
}

impl<H: HostsHandle> PendingRewrite<H> {
    /// Lines that will be written back ahead of the new entry.
    #[cfg(test)]
    pub fn kept(&self) -> &[Vec<u8>] {
        &self.kept
    }

    /// Rewrite the file with the kept lines plus `"<address> <hostname>"`.
    pub fn commit(mut self, address: IpAddr) -> Result<(), HostsError> {
        let content = render(&self.kept, address, &self.hostname);
        let write_err = |source| HostsError::Write {
            hostname: self.hostname.clone(),
            source,
        };

        self.handle.seek(SeekFrom::Start(0)).map_err(write_err)?;
        self.handle
            .write_all(&content)
            .and_then(|_| self.handle.flush())
            .map_err(write_err)?;
        self.handle
            .truncate_to(content.len() as u64)
            .map_err(|source| HostsError::Truncate {
                hostname: self.hostname.clone(),
                source,
            })
    }
}

/// Ensure the hosts file maps `hostname` to `address` exactly once.
pub fn reconcile<S: HostsStore>(
    store: &S,
    address: IpAddr,
    hostname: &str,
) -> Result<(), HostsError> {
    begin(store, hostname)?.commit(address)
}
