//! Local archive extraction for downloaded image batches.

use crate::constants::archive_extensions;
use crate::error::{Error, Result};
use crate::output::progress;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Archive formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Plain tar.
    Tar,
    /// Gzip-compressed tar.
    TarGz,
    /// Zip.
    Zip,
}

impl ArchiveKind {
    /// Detect the archive kind from the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let has_ext = |ext: &str| name.ends_with(&format!(".{ext}"));

        if has_ext(archive_extensions::TAR_GZ) || has_ext(archive_extensions::TGZ) {
            Ok(Self::TarGz)
        } else if has_ext(archive_extensions::TAR) {
            Ok(Self::Tar)
        } else if has_ext(archive_extensions::ZIP) {
            Ok(Self::Zip)
        } else {
            Err(Error::UnsupportedArchive {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Unpack an archive into `outdir`, returning the number of files written.
///
/// Entries whose paths would land outside `outdir` are skipped.
pub fn extract_archive(path: &Path, outdir: &Path, show_progress: bool) -> Result<usize> {
    let kind = ArchiveKind::from_path(path)?;
    info!("Extracting {} into {}", path.display(), outdir.display());

    std::fs::create_dir_all(outdir).map_err(|e| Error::OutputDirCreateFailed {
        path: outdir.to_path_buf(),
        source: e,
    })?;

    let file = File::open(path).map_err(|e| Error::ArchiveOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let pb = progress::create_spinner("entries extracted", show_progress);
    let extracted = match kind {
        ArchiveKind::Tar => unpack_tar(reader, path, outdir, pb.as_ref())?,
        ArchiveKind::TarGz => unpack_tar(GzDecoder::new(reader), path, outdir, pb.as_ref())?,
        ArchiveKind::Zip => unpack_zip(reader, path, outdir, pb.as_ref())?,
    };
    progress::finish_progress(pb, "Extraction complete");

    info!("{extracted} files extracted from {}", path.display());
    Ok(extracted)
}

fn unpack_tar<R: Read>(
    reader: R,
    path: &Path,
    outdir: &Path,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<usize> {
    let extract_error = |entry: String, source| Error::ArchiveExtract {
        path: path.to_path_buf(),
        entry,
        source,
    };

    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| extract_error(String::new(), e))?;

    let mut extracted = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| extract_error(String::new(), e))?;
        let name = entry.path().map_or_else(
            |_| String::from("<invalid path>"),
            |p| p.to_string_lossy().into_owned(),
        );
        let is_file = entry.header().entry_type().is_file();

        let unpacked = entry
            .unpack_in(outdir)
            .map_err(|e| extract_error(name.clone(), e))?;
        if !unpacked {
            warn!("Skipping archive entry outside the output directory: {name}");
            continue;
        }
        if is_file {
            extracted += 1;
        }
        progress::inc_progress(pb);
    }

    Ok(extracted)
}

fn unpack_zip<R: Read + std::io::Seek>(
    reader: R,
    path: &Path,
    outdir: &Path,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<usize> {
    let extract_error = |entry: String, source| Error::ArchiveExtract {
        path: path.to_path_buf(),
        entry,
        source,
    };

    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| extract_error(String::new(), std::io::Error::other(e)))?;

    let mut extracted = 0;
    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .map_err(|e| extract_error(format!("#{idx}"), std::io::Error::other(e)))?;
        let name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry outside the output directory: {name}");
            continue;
        };
        let target = outdir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| extract_error(name.clone(), e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| extract_error(name.clone(), e))?;
            }
            let mut out = File::create(&target).map_err(|e| extract_error(name.clone(), e))?;
            std::io::copy(&mut entry, &mut out).map_err(|e| extract_error(name.clone(), e))?;
            extracted += 1;
        }
        progress::inc_progress(pb);
    }

    Ok(extracted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn append_file<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    #[test]
    fn test_archive_kind_from_path() {
        assert_eq!(
            ArchiveKind::from_path(Path::new("batch.tar.gz")).unwrap(),
            ArchiveKind::TarGz
        );
        assert_eq!(
            ArchiveKind::from_path(Path::new("BATCH.TGZ")).unwrap(),
            ArchiveKind::TarGz
        );
        assert_eq!(
            ArchiveKind::from_path(Path::new("batch.tar")).unwrap(),
            ArchiveKind::Tar
        );
        assert_eq!(
            ArchiveKind::from_path(Path::new("batch.zip")).unwrap(),
            ArchiveKind::Zip
        );
        assert!(matches!(
            ArchiveKind::from_path(Path::new("batch.rar")),
            Err(Error::UnsupportedArchive { .. })
        ));
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("images.tar.gz");
        {
            let file = File::create(&archive_path).unwrap();
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            append_file(&mut builder, "SU16/a.jpg", b"jpeg-a");
            append_file(&mut builder, "SU16/b.jpg", b"jpeg-b");
            builder.into_inner().unwrap().finish().unwrap();
        }

        let outdir = dir.path().join("out");
        let count = extract_archive(&archive_path, &outdir, false).unwrap();
        assert_eq!(count, 2);
        assert_eq!(std::fs::read(outdir.join("SU16").join("b.jpg")).unwrap(), b"jpeg-b");
    }

    #[test]
    fn test_extract_zip() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("images.zip");
        {
            let file = File::create(&archive_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("SU16/a.jpg", options).unwrap();
            writer.write_all(b"jpeg-a").unwrap();
            writer.finish().unwrap();
        }

        let outdir = dir.path().join("out");
        let count = extract_archive(&archive_path, &outdir, false).unwrap();
        assert_eq!(count, 1);
        assert_eq!(std::fs::read(outdir.join("SU16").join("a.jpg")).unwrap(), b"jpeg-a");
    }

    #[test]
    fn test_missing_archive_is_error() {
        let dir = TempDir::new().unwrap();
        let result = extract_archive(&dir.path().join("none.tar"), &dir.path().join("out"), false);
        assert!(matches!(result, Err(Error::ArchiveOpen { .. })));
    }
}
