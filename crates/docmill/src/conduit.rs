//! Bounded in-memory byte conduits connecting pipeline stages.
//!
//! A conduit is a single-writer/single-reader byte channel with
//! backpressure: writes block once a fixed number of unread chunks is
//! buffered, reads block until data or end-of-stream arrives. Dropping the
//! writer signals end-of-stream; dropping the reader turns further writes
//! into `BrokenPipe` errors, which is what lets a failed stage cascade a
//! shutdown through its neighbours.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::{self, Read, Write};

/// Bytes carried per channel message.
pub(crate) const CHUNK_SIZE: usize = 128 * 1024;

/// Unread chunks buffered before a writer blocks.
const DEPTH: usize = 4;

/// Create a connected writer/reader pair.
pub(crate) fn conduit() -> (ConduitWriter, ConduitReader) {
    let (tx, rx) = bounded(DEPTH);
    (
        ConduitWriter {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        },
        ConduitReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Write end of a conduit.
pub(crate) struct ConduitWriter {
    tx: Sender<Vec<u8>>,
    buf: Vec<u8>,
}

impl ConduitWriter {
    fn send_buf(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        self.tx
            .send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "conduit reader closed"))
    }
}

impl Write for ConduitWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let take = data.len().min(CHUNK_SIZE - self.buf.len());
        self.buf.extend_from_slice(&data[..take]);
        if self.buf.len() == CHUNK_SIZE {
            self.send_buf()?;
        }
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buf()
    }
}

impl Drop for ConduitWriter {
    fn drop(&mut self) {
        // Flush whatever is pending; dropping the sender then signals
        // end-of-stream to the reader.
        let _ = self.send_buf();
    }
}

/// Read end of a conduit.
pub(crate) struct ConduitReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for ConduitReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos == self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                // Writer gone: end-of-stream.
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.chunk.len() - self.pos);
        out[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_roundtrip() {
        let (mut writer, mut reader) = conduit();
        writer.write_all(b"hello conduit").unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello conduit");
    }

    #[test]
    fn test_writer_drop_is_end_of_stream() {
        let (writer, mut reader) = conduit();
        drop(writer);

        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_reader_drop_breaks_writes() {
        let (mut writer, reader) = conduit();
        drop(reader);

        let big = vec![0u8; CHUNK_SIZE];
        let err = writer.write_all(&big).and_then(|_| writer.flush());
        assert_eq!(err.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_large_transfer_across_threads() {
        let payload: Vec<u8> = (0..3 * CHUNK_SIZE + 17).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let (mut writer, mut reader) = conduit();
        let producer = thread::spawn(move || {
            writer.write_all(&payload).unwrap();
            // Writer dropped here flushes the tail and closes.
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_backpressure_blocks_writer() {
        let (mut writer, mut reader) = conduit();

        let producer = thread::spawn(move || {
            // More full chunks than the conduit can buffer.
            let chunk = vec![1u8; CHUNK_SIZE];
            for _ in 0..8 {
                writer.write_all(&chunk).unwrap();
            }
        });

        // Give the producer time to fill the conduit and block.
        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out.len(), 8 * CHUNK_SIZE);
    }
}
