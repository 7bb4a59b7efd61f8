// tar.gz archive writer and single-file gzip (Compressor adapter)
// reason: tar + flate2 for the archive format, tempfile for write-then-rename
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use hostkeeper_core::error::{AppError, Result};
use hostkeeper_core::port::compressor::gzip_path;
use hostkeeper_core::port::{ArchiveRequest, Compressor};

/// Writes gzip output to a temp file beside the target and renames it into
/// place once complete, so readers never observe a half-written file.
#[derive(Debug, Clone, Copy)]
pub struct TarGzCompressor {
    level: Compression,
}

impl TarGzCompressor {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// gzip level 0 (store) - 9 (best)
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for TarGzCompressor {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Temp file beside the target; created with the regular-file default mode
/// (0666 minus umask) instead of tempfile's owner-only 0600
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".hostkeeper-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Flush a gzip stream into its temp file
fn finish_encoder(encoder: GzEncoder<BufWriter<&File>>) -> io::Result<()> {
    let writer = encoder.finish()?;
    writer.into_inner().map_err(|e| e.into_error())?;
    Ok(())
}

fn write_archive_blocking(level: Compression, request: ArchiveRequest) -> Result<u64> {
    let parent = parent_dir(&request.destination);
    fs::create_dir_all(&parent)?;

    // Dropped (and deleted) on any early return below
    let tmp = temp_file_in(&parent)?;

    let encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), level);
    let mut builder = tar::Builder::new(encoder);
    // symlinks become link entries, never the target's content
    builder.follow_symlinks(false);
    for member in &request.members {
        let name = Path::new(&request.root_name).join(&member.relative_path);
        builder.append_path_with_name(&member.source, &name)?;
    }
    finish_encoder(builder.into_inner()?)?;

    tmp.as_file().sync_all()?;
    let size = tmp.as_file().metadata()?.len();
    tmp.persist(&request.destination)
        .map_err(|e| AppError::Io(e.error))?;

    Ok(size)
}

fn gzip_file_blocking(level: Compression, path: &Path) -> Result<u64> {
    let target = gzip_path(path);
    if target.exists() {
        return Err(AppError::Conflict(format!(
            "{} already exists",
            target.display()
        )));
    }

    let source = File::open(path)?;
    let permissions = source.metadata()?.permissions();
    let mut reader = BufReader::new(source);
    let tmp = temp_file_in(&parent_dir(path))?;

    let mut encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), level);
    io::copy(&mut reader, &mut encoder)?;
    finish_encoder(encoder)?;

    // rotated log keeps the original's mode
    tmp.as_file().set_permissions(permissions)?;
    tmp.as_file().sync_all()?;
    let size = tmp.as_file().metadata()?.len();
    tmp.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            AppError::Conflict(format!("{} already exists", target.display()))
        } else {
            AppError::Io(e.error)
        }
    })?;

    fs::remove_file(path)?;

    Ok(size)
}

#[async_trait]
impl Compressor for TarGzCompressor {
    async fn write_archive(&self, request: ArchiveRequest) -> Result<u64> {
        let level = self.level;
        let destination = request.destination.clone();
        let members = request.members.len();

        debug!(destination = %destination.display(), members, "Writing archive");

        let size = crate::blocking(move || write_archive_blocking(level, request)).await?;

        info!(
            destination = %destination.display(),
            members,
            size_bytes = size,
            "Archive written"
        );

        Ok(size)
    }

    async fn gzip_file(&self, path: &Path) -> Result<u64> {
        let level = self.level;
        let source = path.to_path_buf();

        let size = crate::blocking(move || gzip_file_blocking(level, &source)).await?;

        info!(path = %path.display(), compressed_bytes = size, "Log compressed");

        Ok(size)
    }
}
