use fs2::FileExt;
use log::debug;

use std::{
    ffi, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    directory::{Data, Directory, Kind, LoadMMap},
    util::files,
    Error, Result,
};

const LOCK_FILE: &str = "writer.lock";

fn item_ext(kind: Kind) -> &'static str {
    match kind {
        Kind::Snapshot => "snp",
        Kind::Segment => "seg",
    }
}

fn item_file_name(kind: Kind, id: u64) -> String {
    format!("{}.{:012x}.{}", kind.as_str(), id, item_ext(kind))
}

fn parse_item_file_name(kind: Kind, name: &ffi::OsStr) -> Option<u64> {
    let name = name.to_str()?;
    let rest = name.strip_prefix(kind.as_str())?.strip_prefix('.')?;
    let hex = rest.strip_suffix(item_ext(kind))?.strip_suffix('.')?;
    u64::from_str_radix(hex, 16).ok()
}

/// Directory backed by a filesystem path. Items are published by writing to
/// a temporary file, syncing, and renaming into place. The writer lock is an
/// exclusive POSIX lock on `writer.lock`.
pub struct FileSystemDirectory {
    dir: PathBuf,
    load_mmap: LoadMMap,
    lock_fd: Mutex<Option<fs::File>>,
}

impl FileSystemDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> FileSystemDirectory {
        FileSystemDirectory {
            dir: dir.as_ref().to_path_buf(),
            load_mmap: LoadMMap::Always,
            lock_fd: Mutex::new(None),
        }
    }

    /// Configure when items load through mmap instead of heap buffers.
    pub fn set_load_mmap(mut self, policy: LoadMMap) -> FileSystemDirectory {
        self.load_mmap = policy;
        self
    }

    pub fn to_location(&self) -> PathBuf {
        self.dir.clone()
    }

    fn item_path(&self, kind: Kind, id: u64) -> PathBuf {
        self.dir.join(item_file_name(kind, id))
    }

    fn setup(&self) -> Result<()> {
        err_at!(IOError, fs::create_dir_all(&self.dir))
    }

    // fsync the directory entry so the rename itself is durable.
    fn sync_dir(&self) -> Result<()> {
        let fd = err_at!(IOError, fs::File::open(&self.dir))?;
        err_at!(IOError, fd.sync_all())
    }
}

impl Directory for FileSystemDirectory {
    fn list(&self, kind: Kind) -> Result<Vec<u64>> {
        let mut ids = vec![];
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(ids), // directory not created yet
        };
        for entry in entries {
            let entry = err_at!(IOError, entry)?;
            if let Some(id) = parse_item_file_name(kind, &entry.file_name()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn load(&self, kind: Kind, id: u64) -> Result<Data> {
        let loc = self.item_path(kind, id);
        if !loc.exists() {
            let (k, p) = (kind.as_str(), &loc);
            return match kind {
                Kind::Segment => err_at!(SegmentMissing, msg: "{} {:?}", k, p),
                Kind::Snapshot => err_at!(InvalidFile, msg: "{} {:?}", k, p),
            };
        }

        if self.load_mmap.applies(kind, id) {
            let fd = files::open_file_r(loc.as_os_str())?;
            let mmap = err_at!(IOError, unsafe { memmap2::Mmap::map(&fd) })?;
            Ok(Data::Mmap(Arc::new(mmap)))
        } else {
            let data = err_at!(IOError, fs::read(&loc))?;
            Ok(Data::from_vec(data))
        }
    }

    fn persist(&self, kind: Kind, id: u64, data: &[u8]) -> Result<()> {
        self.setup()?;

        let loc = self.item_path(kind, id);
        let tmp = loc.with_extension("tmp");

        let mut fd = files::create_file_w(tmp.as_os_str())?;
        files::sync_write(&mut fd, data)?;
        err_at!(IOError, fs::rename(&tmp, &loc), "rename {:?}", loc)?;
        self.sync_dir()?;

        debug!(target: "directory", "persisted {} {} ({} bytes)", kind.as_str(), id, data.len());
        Ok(())
    }

    fn remove(&self, kind: Kind, id: u64) -> Result<()> {
        let loc = self.item_path(kind, id);
        err_at!(IOError, fs::remove_file(&loc), "remove {:?}", loc)
    }

    fn lock(&self) -> Result<()> {
        self.setup()?;

        let loc = self.dir.join(LOCK_FILE);
        let fd = err_at!(
            IOError,
            fs::OpenOptions::new().create(true).write(true).open(&loc)
        )?;
        match fd.try_lock_exclusive() {
            Ok(_) => {
                *self.lock_fd.lock().unwrap() = Some(fd);
                Ok(())
            }
            Err(_) => err_at!(DirectoryLocked, msg: "{:?}", loc),
        }
    }

    fn unlock(&self) -> Result<()> {
        match self.lock_fd.lock().unwrap().take() {
            Some(fd) => err_at!(IOError, fd.unlock()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fs_test.rs"]
mod fs_test;
