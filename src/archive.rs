// In: src/archive.rs

//! Opens the on-disk wrapper of an input file and hands back a plain byte stream.
//!
//! Every reader returned here is owned, so the decoder that holds it also owns the
//! underlying file handle. Dropping the decoder (normally, on error, or because the
//! consumer stopped iterating early) closes the file.
//!
//! Zip members are streamed straight from their data offset instead of through
//! `ZipArchive::by_index`, whose reader borrows the archive and therefore cannot
//! be stored next to it.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::{DeflateDecoder, MultiGzDecoder};
use zip::{CompressionMethod, ZipArchive};

use crate::config::ArchiveFormat;
use crate::error::TaqError;

/// An owned, buffered stream over the decompressed contents of an input file.
pub type ArchiveReader = Box<dyn BufRead + Send>;

/// Opens `path` and returns a reader over its decompressed bytes.
pub fn open_archive(path: &Path, format: ArchiveFormat) -> Result<ArchiveReader, TaqError> {
    let format = format.resolve(path);
    log::debug!("Opening {} as {:?}", path.display(), format);

    match format {
        ArchiveFormat::Zip => open_zip_member(path),
        ArchiveFormat::Gzip => {
            let file = BufReader::new(File::open(path)?);
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        }
        ArchiveFormat::Zstd => {
            let decoder = zstd::stream::read::Decoder::new(File::open(path)?)?;
            Ok(Box::new(BufReader::new(decoder)))
        }
        ArchiveFormat::Plain | ArchiveFormat::Auto => {
            Ok(Box::new(BufReader::new(File::open(path)?)))
        }
    }
}

/// Streams the first member of a zip archive.
///
/// Quote archives hold exactly one member per trading day; any further members are
/// reported and ignored.
fn open_zip_member(path: &Path) -> Result<ArchiveReader, TaqError> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
    if archive.len() == 0 {
        return Err(TaqError::UnsupportedArchive(format!(
            "{} contains no members",
            path.display()
        )));
    }
    if archive.len() > 1 {
        log::warn!(
            "{} holds {} members; only the first is decoded",
            path.display(),
            archive.len()
        );
    }

    let (name, data_start, compressed_size, method) = {
        let member = archive.by_index_raw(0)?;
        if member.encrypted() {
            return Err(TaqError::UnsupportedArchive(format!(
                "zip member '{}' is encrypted",
                member.name()
            )));
        }
        (
            member.name().to_string(),
            member.data_start(),
            member.compressed_size(),
            member.compression(),
        )
    };
    log::info!(
        "Reading zip member '{}' ({} compressed bytes, {:?})",
        name,
        compressed_size,
        method
    );

    let mut inner = archive.into_inner();
    inner.seek(SeekFrom::Start(data_start))?;
    let member_bytes = inner.take(compressed_size);

    match method {
        CompressionMethod::Stored => Ok(Box::new(member_bytes)),
        CompressionMethod::Deflated => {
            Ok(Box::new(BufReader::new(DeflateDecoder::new(member_bytes))))
        }
        other => Err(TaqError::UnsupportedArchive(format!(
            "zip member '{}' uses unsupported compression {:?}",
            name, other
        ))),
    }
}
