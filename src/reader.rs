//! Memory-mapped ITCH capture reader.
//!
//! An ITCH 5.0 capture is a contiguous stream of length-prefixed records:
//! `(u16 big-endian length)(payload)`, with no gaps, padding or alignment.
//! The reader maps the file read-only and yields zero-copy payload slices,
//! so a multi-gigabyte session is framed without a single allocation per
//! message.
//!
//! Two access paths share the same mapping:
//! - [`MessageReader::messages`] iterates frames sequentially for the replay
//!   loop;
//! - [`MessageReader::read_at`] re-reads a frame at a stored offset, used by
//!   the engine to chase replacement chains back to the originating add.
//!
//! The reader owns the mapping; every [`RawMessage`] borrows from it, so the
//! mapping outlives all views by construction.
//!
//! A truncated trailing frame is not an error: it terminates the stream
//! cleanly, matching how captures cut mid-write behave in practice.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{ItchError, Result};
use crate::message::RawMessage;
use crate::types::FRAME_LENGTH_SIZE;

/// Read-only view over a mapped ITCH capture file.
pub struct MessageReader {
    path: PathBuf,
    map: Mmap,
}

impl MessageReader {
    /// Map a capture file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`ItchError::CaptureOpen`] if the file cannot be opened or
    /// mapped, or if it is empty. This is the only fatal error in the
    /// replay path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path)
            .map_err(|e| ItchError::capture_open(&path, e.to_string()))?;

        // Safety: the mapping is read-only and the file is opened read-only.
        // Concurrent truncation of the capture by another process is outside
        // the supported usage, as with any mapped-file reader.
        let map = unsafe { Mmap::map(&file) }
            .map_err(|e| ItchError::capture_open(&path, e.to_string()))?;

        if map.is_empty() {
            return Err(ItchError::capture_open(&path, "file is empty"));
        }

        Ok(Self { path, map })
    }

    /// The capture path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total size of the mapped region in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the mapping is empty. Always false for an open reader.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Read the frame that starts at `offset`.
    ///
    /// Returns `None` when the length prefix or the payload would run past
    /// the end of the mapping. The sequential cursor of any live iterator is
    /// unaffected.
    #[inline]
    pub fn read_at(&self, offset: usize) -> Option<RawMessage<'_>> {
        let data = &self.map;

        if offset + FRAME_LENGTH_SIZE > data.len() {
            return None;
        }

        let length = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
        let start = offset + FRAME_LENGTH_SIZE;

        if start + length > data.len() {
            return None;
        }

        Some(RawMessage::new(offset, &data[start..start + length]))
    }

    /// Iterate over all frames from the start of the capture.
    pub fn messages(&self) -> Messages<'_> {
        Messages {
            reader: self,
            offset: 0,
        }
    }
}

/// Sequential frame iterator over a capture.
///
/// Yields `(offset, payload)` views in file order. Ends cleanly at the first
/// truncated frame.
pub struct Messages<'a> {
    reader: &'a MessageReader,
    offset: usize,
}

impl<'a> Messages<'a> {
    /// Byte offset of the next frame to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Messages<'a> {
    type Item = RawMessage<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let msg = self.reader.read_at(self.offset)?;
        self.offset += FRAME_LENGTH_SIZE + msg.payload().len();
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn write_temp_capture(name: &str, bytes: &[u8]) -> PathBuf {
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "reader_test_{}_{}_{}",
            std::process::id(),
            name,
            counter
        ));
        fs::write(&path, bytes).unwrap();
        path
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_open_nonexistent() {
        let result = MessageReader::open("/nonexistent/capture.itch");
        assert!(matches!(result, Err(ItchError::CaptureOpen { .. })));
    }

    #[test]
    fn test_open_empty_file() {
        let path = write_temp_capture("empty", &[]);
        let result = MessageReader::open(&path);
        assert!(matches!(result, Err(ItchError::CaptureOpen { .. })));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_sequential_framing() {
        let mut bytes = frame(b"first");
        bytes.extend(frame(b"second!"));
        let path = write_temp_capture("sequential", &bytes);

        let reader = MessageReader::open(&path).unwrap();
        let mut iter = reader.messages();

        let first = iter.next().unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(first.payload(), b"first");

        let second = iter.next().unwrap();
        assert_eq!(second.offset(), 2 + 5);
        assert_eq!(second.payload(), b"second!");

        assert!(iter.next().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_trailing_frame_ends_stream() {
        // A full frame followed by a length prefix that promises more bytes
        // than remain.
        let mut bytes = frame(b"whole");
        bytes.extend_from_slice(&100u16.to_be_bytes());
        bytes.extend_from_slice(b"short");
        let path = write_temp_capture("truncated", &bytes);

        let reader = MessageReader::open(&path).unwrap();
        let payloads: Vec<_> = reader.messages().map(|m| m.payload().to_vec()).collect();
        assert_eq!(payloads, vec![b"whole".to_vec()]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_length_prefix_ends_stream() {
        let mut bytes = frame(b"whole");
        bytes.push(0); // lone half of a length prefix
        let path = write_temp_capture("half_prefix", &bytes);

        let reader = MessageReader::open(&path).unwrap();
        assert_eq!(reader.messages().count(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_read_at_does_not_disturb_iteration() {
        let mut bytes = frame(b"one");
        bytes.extend(frame(b"two"));
        bytes.extend(frame(b"three"));
        let path = write_temp_capture("read_at", &bytes);

        let reader = MessageReader::open(&path).unwrap();
        let mut iter = reader.messages();
        let first = iter.next().unwrap();

        // Random access back to an earlier offset while iterating.
        let again = reader.read_at(first.offset()).unwrap();
        assert_eq!(again.payload(), b"one");

        assert_eq!(iter.next().unwrap().payload(), b"two");
        assert_eq!(iter.next().unwrap().payload(), b"three");
        assert!(iter.next().is_none());

        // Out-of-range offsets are a clean None.
        assert!(reader.read_at(bytes.len()).is_none());
        assert!(reader.read_at(bytes.len() - 1).is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_zero_length_frame() {
        let mut bytes = frame(b"");
        bytes.extend(frame(b"after"));
        let path = write_temp_capture("zero_len", &bytes);

        let reader = MessageReader::open(&path).unwrap();
        let payloads: Vec<_> = reader.messages().map(|m| m.payload().to_vec()).collect();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].is_empty());
        assert_eq!(payloads[1], b"after");
        let _ = fs::remove_file(&path);
    }
}
