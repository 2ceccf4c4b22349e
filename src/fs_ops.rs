//! Filesystem, hashing and compression operations used by the built-ins.
//!
//! Everything here streams through fixed-size buffers, so file size doesn't
//! affect memory use.

use crate::error::CommandError;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

const CHUNK_SIZE: usize = 64 * 1024;
const BROTLI_BUFFER_SIZE: usize = 4096;

/// One directory entry as shown by `ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub name: String,
    pub is_dir: bool,
}

/// Entries of `dir`, directories first, each group sorted by name.
pub(crate) fn list(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: entry.file_type()?.is_dir(),
        });
    }
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// Create an empty file at `path`, failing if it already exists.
pub(crate) fn create_empty(path: &Path) -> io::Result<()> {
    OpenOptions::new().write(true).create_new(true).open(path)?;
    Ok(())
}

/// Stream `path` into `out`. Returns the last byte written, if any.
pub(crate) fn stream_to(path: &Path, out: &mut dyn Write) -> io::Result<Option<u8>> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut last = None;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        last = Some(buf[n - 1]);
    }
    Ok(last)
}

/// Copy a single file, failing if `dest` already exists.
pub(crate) fn copy_file_exclusive(src: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = File::open(src)?;
    let permissions = reader.metadata()?.permissions();
    let file = OpenOptions::new().write(true).create_new(true).open(dest)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    io::copy(&mut reader, &mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.set_permissions(permissions)
}

/// Copy a file or a whole directory tree. `dest` must not exist.
pub(crate) fn copy(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::metadata(src)?.is_dir() {
        copy_dir(src, dest)
    } else {
        copy_file_exclusive(src, dest)
    }
}

/// Copy a directory tree.
///
/// The children of each directory are split between scoped workers, bounded by the
/// available parallelism. Every worker is joined before returning and the first
/// error seen is the one reported.
fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    let entries = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
    fs::create_dir(dest)?;
    if entries.is_empty() {
        return Ok(());
    }

    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .min(entries.len());
    let chunk_len = entries.len().div_ceil(workers);

    thread::scope(|scope| {
        let handles: Vec<_> = entries
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .try_for_each(|entry| copy(&entry.path(), &dest.join(entry.file_name())))
                })
            })
            .collect();
        handles.into_iter().try_for_each(|handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("copy worker panicked")))
        })
    })
}

/// Remove a file, or a directory tree when `recursive` is set.
pub(crate) fn remove(path: &Path, recursive: bool) -> io::Result<()> {
    if recursive && fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copy `src` to `dest`, then remove `src`.
///
/// A directory can't be moved into itself or one of its descendants.
pub(crate) fn move_path(src: &Path, dest: &Path) -> Result<(), CommandError> {
    if fs::metadata(src)?.is_dir() {
        let src = fs::canonicalize(src)?;
        let parent = dest.parent().and_then(|p| fs::canonicalize(p).ok());
        if parent.is_some_and(|parent| parent.starts_with(&src)) {
            return Err(CommandError::Failed(format!(
                "can't move {} into itself",
                src.display()
            )));
        }
    }
    copy(src, dest)?;
    Ok(remove(src, true)?)
}

/// Whether both paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn refuse_same_file(src: &Path, dest: &Path) -> Result<(), CommandError> {
    if same_file(src, dest) {
        return Err(CommandError::Failed(format!(
            "{} is both source and destination",
            src.display()
        )));
    }
    Ok(())
}

/// SHA-256 of the file contents as 64 lowercase hex characters.
pub(crate) fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Brotli-compress `src` into `dest`. `dest` is created or truncated, unless it is
/// `src` itself.
pub(crate) fn compress(src: &Path, dest: &Path) -> Result<(), CommandError> {
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, File::open(src)?);
    refuse_same_file(src, dest)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, File::create(dest)?);
    let params = brotli::enc::BrotliEncoderParams::default();
    brotli::BrotliCompress(&mut reader, &mut writer, &params)?;
    Ok(writer.flush()?)
}

/// Decompress a Brotli stream from `src` into `dest`. `dest` is created or truncated,
/// unless it is `src` itself.
pub(crate) fn decompress(src: &Path, dest: &Path) -> Result<(), CommandError> {
    let mut decoder = brotli::Decompressor::new(File::open(src)?, BROTLI_BUFFER_SIZE);
    refuse_same_file(src, dest)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, File::create(dest)?);
    io::copy(&mut decoder, &mut writer)?;
    Ok(writer.flush()?)
}
