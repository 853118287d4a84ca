//! Point-in-time readiness probe for pending files
//!
//! A file is ready once it can be opened for exclusive read access. The
//! probe never retries; the orchestrator owns the poll loop.

use std::fs::File;
use std::io;
use std::path::Path;

/// Decides whether a file has finished being written
pub trait ReadinessProbe: Send + Sync {
    /// Returns true if the file can be opened exclusively right now
    fn is_ready(&self, path: &Path) -> bool;
}

/// Probe that opens the file with exclusive access
///
/// On Linux a read lease is taken and dropped again; the kernel refuses it
/// while any process has the file open for writing. Where leases are not
/// available (other Unixes, filesystems without lease support, files owned
/// by another user) a non-blocking `flock` is used, which only sees writers
/// holding an advisory lock. On Windows the file is opened with share mode
/// 0, which fails while any other handle is open.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExclusiveOpen;

impl ReadinessProbe for ExclusiveOpen {
    fn is_ready(&self, path: &Path) -> bool {
        match open_exclusive(path) {
            Ok(_file) => true,
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "file not ready");
                false
            }
        }
    }
}

/// Open `path` read-only without sharing it; the handle (and any lock)
/// is released when the returned file is dropped
#[cfg(unix)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    if !try_read_lease(&file)? {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "file is open for writing",
        ));
    }
    if !try_flock_exclusive(&file)? {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "file is locked by another handle",
        ));
    }
    Ok(file)
}

#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .read(true)
        .share_mode(0)
        .open(path)
}

#[cfg(not(any(unix, windows)))]
fn open_exclusive(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Take and release a read lease on `file`
///
/// Returns `Ok(false)` while another descriptor has the file open for
/// writing. Errors meaning "leases unsupported here" count as success so
/// the `flock` check still runs.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn try_read_lease(file: &File) -> io::Result<bool> {
    use nix::errno::Errno;
    use nix::libc;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: `fd` is a valid descriptor owned by `file` for this call
    let taken = Errno::result(unsafe { libc::fcntl(fd, libc::F_SETLEASE, libc::F_RDLCK) });
    match taken {
        Ok(_) => {
            // SAFETY: as above
            let _ = unsafe { libc::fcntl(fd, libc::F_SETLEASE, libc::F_UNLCK) };
            Ok(true)
        }
        Err(Errno::EAGAIN) => Ok(false),
        Err(e @ (Errno::EINVAL | Errno::EACCES | Errno::EPERM | Errno::ENOSYS | Errno::ENOLCK)) => {
            tracing::trace!(error = %e, "read lease unavailable, using flock");
            Ok(true)
        }
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
fn try_read_lease(_file: &File) -> io::Result<bool> {
    Ok(true)
}

/// Try to acquire exclusive file lock (non-blocking)
#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(io::Error::from(e)),
    }
}
