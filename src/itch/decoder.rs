//! Streaming decoder for length-prefixed tagged message files.

use std::io::{ErrorKind, Read};
use std::path::Path;

use super::layouts::layout_for;
use super::message::BinaryMessage;
use crate::archive::{open_archive, ArchiveReader};
use crate::config::FeedConfig;
use crate::error::TaqError;

const LENGTH_PREFIX: usize = 2;

/// Running counters for one feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Frames read, including skipped ones.
    pub frames: u64,
    /// Messages yielded.
    pub messages: u64,
    pub skipped_unknown: u64,
    pub skipped_empty: u64,
}

/// Yields one `BinaryMessage` per frame of a `[u16 BE length][payload]` stream.
///
/// Frames whose tag has no layout are skipped (or yielded as `Unrecognized`, see
/// `FeedConfig::emit_unrecognized`), as are zero-length frames. A short read in
/// the middle of a frame is a `TruncatedFrame` error; a known tag whose frame
/// length disagrees with its layout is a `MalformedMessage` error. Either error
/// ends the stream.
pub struct MessageDecoder<R> {
    reader: R,
    config: FeedConfig,
    stats: FeedStats,
    done: bool,
}

impl MessageDecoder<ArchiveReader> {
    /// Opens a feed file (typically gzip) on disk.
    pub fn open(path: impl AsRef<Path>, config: FeedConfig) -> Result<Self, TaqError> {
        let path = path.as_ref();
        log::info!("Opening message feed {}", path.display());
        let reader = open_archive(path, config.archive_format)?;
        Ok(Self::new(reader, config))
    }
}

impl<R: Read> MessageDecoder<R> {
    pub fn new(reader: R, config: FeedConfig) -> Self {
        Self {
            reader,
            config,
            stats: FeedStats::default(),
            done: false,
        }
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Reads one frame payload. `Ok(None)` means a clean end of input.
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TaqError> {
        let mut prefix = [0u8; LENGTH_PREFIX];
        match read_full(&mut self.reader, &mut prefix)? {
            0 => return Ok(None),
            LENGTH_PREFIX => {}
            actual => {
                return Err(TaqError::TruncatedFrame {
                    expected: LENGTH_PREFIX,
                    actual,
                })
            }
        }

        let len = u16::from_be_bytes(prefix) as usize;
        let mut payload = vec![0u8; len];
        let actual = read_full(&mut self.reader, &mut payload)?;
        if actual != len {
            return Err(TaqError::TruncatedFrame {
                expected: len,
                actual,
            });
        }
        Ok(Some(payload))
    }

    fn next_message(&mut self) -> Result<Option<BinaryMessage>, TaqError> {
        while let Some(payload) = self.read_frame()? {
            self.stats.frames += 1;
            let Some(&tag) = payload.first() else {
                self.stats.skipped_empty += 1;
                continue;
            };

            let message = match layout_for(tag) {
                Some(layout) => layout.decode(&payload)?,
                None if self.config.emit_unrecognized => BinaryMessage::Unrecognized { tag, payload },
                None => {
                    log::debug!("Skipping frame with unknown tag {:?}", tag as char);
                    self.stats.skipped_unknown += 1;
                    continue;
                }
            };
            self.stats.messages += 1;
            return Ok(Some(message));
        }
        Ok(None)
    }
}

impl<R: Read> Iterator for MessageDecoder<R> {
    type Item = Result<BinaryMessage, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_message() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => {
                self.done = true;
                log::info!(
                    "Feed finished: {} messages from {} frames ({} unknown, {} empty skipped)",
                    self.stats.messages,
                    self.stats.frames,
                    self.stats.skipped_unknown,
                    self.stats.skipped_empty
                );
                None
            }
            Err(e) => {
                self.done = true;
                log::error!("Feed decoding stopped after {} frames: {}", self.stats.frames, e);
                Some(Err(e))
            }
        }
    }
}

/// Fills `buf` unless the input ends first; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, TaqError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
