//! A byte stream that accumulates incoming chunks of any size and exposes
//! them for reading and peeking as one contiguous stream.

use std::collections::VecDeque;

/// A byte stream over a queue of incoming chunks. Reads and peeks span chunk
/// boundaries transparently, and consumed chunks are released as soon as
/// their last byte has been read.
///
/// Incoming bytes can optionally be passed through zlib inflate prior to
/// being made available for reading, which is needed for data using a
/// deflated transfer syntax.
///
#[derive(Debug)]
pub struct ByteStream {
  chunks: VecDeque<Vec<u8>>,
  head_offset: usize,
  bytes_available: usize,
  bytes_read: u64,
  is_writing_finished: bool,
  inflater: Option<flate2::Decompress>,
  deflated_chunks: VecDeque<Vec<u8>>,
  is_inflate_finished: bool,
}

#[derive(Debug, PartialEq)]
pub enum ByteStreamError {
  /// The byte stream does not currently hold the number of bytes requested
  /// and needs more bytes to be written to it first.
  DataRequired,

  /// The requested read would go past the end of the byte stream.
  DataEnd,

  /// Data written to a byte stream that has zlib inflate active was not
  /// valid deflated data.
  ZlibDataError,

  /// Data was written to a byte stream after its final bytes have already
  /// been written.
  WriteAfterCompletion,
}

/// Deflated data is inflated in chunks of at most this size so that the
/// memory held by a byte stream stays bounded regardless of the compression
/// ratio of its input.
///
const INFLATE_CHUNK_SIZE: usize = 64 * 1024;

impl ByteStream {
  /// Creates a new empty byte stream.
  ///
  pub fn new() -> ByteStream {
    ByteStream {
      chunks: VecDeque::new(),
      head_offset: 0,
      bytes_available: 0,
      bytes_read: 0,
      is_writing_finished: false,
      inflater: None,
      deflated_chunks: VecDeque::new(),
      is_inflate_finished: false,
    }
  }

  /// Returns the total number of bytes that have been read out of a byte
  /// stream.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.bytes_read
  }

  /// Returns the number of bytes that are currently available to be read.
  ///
  pub fn bytes_available(&self) -> usize {
    self.bytes_available
  }

  /// Returns whether the byte stream is fully consumed, i.e. no unread bytes
  /// remain and the final bytes have been written.
  ///
  pub fn is_fully_consumed(&self) -> bool {
    self.bytes_available == 0
      && self.is_writing_finished
      && (self.inflater.is_none()
        || self.is_inflate_finished
        || self.deflated_chunks.is_empty())
  }

  /// Writes a chunk of bytes to a byte stream so it is available to
  /// subsequent calls to `read` and `peek`. If `done` is true then this
  /// signals that no more bytes will be written, and any further call to
  /// `write` will error.
  ///
  pub fn write(
    &mut self,
    chunk: Vec<u8>,
    done: bool,
  ) -> Result<(), ByteStreamError> {
    if self.is_writing_finished {
      return Err(ByteStreamError::WriteAfterCompletion);
    }

    self.is_writing_finished = done;

    if chunk.is_empty() {
      return Ok(());
    }

    if self.inflater.is_some() {
      self.deflated_chunks.push_back(chunk);
    } else {
      self.bytes_available += chunk.len();
      self.chunks.push_back(chunk);
    }

    Ok(())
  }

  /// Reads the given number of bytes out of a byte stream.
  ///
  pub fn read(&mut self, byte_count: usize) -> Result<Vec<u8>, ByteStreamError> {
    self.inflate_up_to(byte_count)?;

    if byte_count > self.bytes_available {
      return Err(self.underflow_error());
    }

    let mut result = Vec::with_capacity(byte_count);

    while result.len() < byte_count {
      let chunk = self.chunks.front().unwrap();
      let available = chunk.len() - self.head_offset;
      let wanted = byte_count - result.len();

      let take = core::cmp::min(available, wanted);
      result
        .extend_from_slice(&chunk[self.head_offset..self.head_offset + take]);

      if take == available {
        self.chunks.pop_front();
        self.head_offset = 0;
      } else {
        self.head_offset += take;
      }
    }

    self.bytes_available -= byte_count;
    self.bytes_read += byte_count as u64;

    Ok(result)
  }

  /// Reads up to the given number of bytes out of a byte stream, returning
  /// fewer when fewer are available.
  ///
  pub fn read_up_to(
    &mut self,
    byte_count: usize,
  ) -> Result<Vec<u8>, ByteStreamError> {
    self.inflate_up_to(byte_count)?;

    self.read(core::cmp::min(byte_count, self.bytes_available))
  }

  /// Peeks at the next bytes that will be read out of a byte stream without
  /// consuming them.
  ///
  pub fn peek(&mut self, byte_count: usize) -> Result<Vec<u8>, ByteStreamError> {
    self.inflate_up_to(byte_count)?;

    if byte_count > self.bytes_available {
      return Err(self.underflow_error());
    }

    let mut result = Vec::with_capacity(byte_count);
    let mut offset = self.head_offset;

    for chunk in self.chunks.iter() {
      let take = core::cmp::min(chunk.len() - offset, byte_count - result.len());
      result.extend_from_slice(&chunk[offset..offset + take]);
      offset = 0;

      if result.len() == byte_count {
        break;
      }
    }

    Ok(result)
  }

  /// Converts this byte stream into one that passes all unread and all
  /// subsequently written bytes through streaming zlib inflate, making the
  /// inflated bytes the ones available for reading. Used when the transfer
  /// syntax of the data following the File Meta Information is deflated.
  ///
  pub fn start_zlib_inflate(&mut self) {
    self.inflater = Some(flate2::Decompress::new(false));

    // Any unread bytes become deflated input. Whole chunks are moved; the
    // partially consumed head chunk is trimmed first.
    if self.head_offset > 0 {
      if let Some(chunk) = self.chunks.pop_front() {
        self.deflated_chunks.push_back(chunk[self.head_offset..].to_vec());
        self.head_offset = 0;
      }
    }

    self.deflated_chunks.extend(self.chunks.drain(..));
    self.bytes_available = 0;
  }

  fn underflow_error(&self) -> ByteStreamError {
    if self.is_writing_finished {
      ByteStreamError::DataEnd
    } else {
      ByteStreamError::DataRequired
    }
  }

  /// When zlib inflate is active, inflates pending deflated input until the
  /// requested number of bytes is available to read, the input is exhausted,
  /// or the inflate stream ends. Inflation happens in bounded chunks so a
  /// deflate bomb can't balloon memory.
  ///
  fn inflate_up_to(
    &mut self,
    byte_count: usize,
  ) -> Result<(), ByteStreamError> {
    let Some(inflater) = self.inflater.as_mut() else {
      return Ok(());
    };

    while self.bytes_available < byte_count && !self.is_inflate_finished {
      let Some(input) = self.deflated_chunks.pop_front() else {
        return Ok(());
      };

      let initial_total_in = inflater.total_in();
      let initial_total_out = inflater.total_out();

      let mut output = vec![0u8; INFLATE_CHUNK_SIZE];

      let status = inflater
        .decompress(&input, &mut output, flate2::FlushDecompress::None)
        .map_err(|_| ByteStreamError::ZlibDataError)?;

      let bytes_consumed = (inflater.total_in() - initial_total_in) as usize;
      let bytes_produced = (inflater.total_out() - initial_total_out) as usize;

      // Keep unconsumed input for the next inflate call
      if bytes_consumed < input.len() {
        self
          .deflated_chunks
          .push_front(input[bytes_consumed..].to_vec());
      }

      if bytes_produced > 0 {
        output.truncate(bytes_produced);
        self.bytes_available += bytes_produced;
        self.chunks.push_back(output);
      }

      if status == flate2::Status::StreamEnd {
        self.is_inflate_finished = true;
      } else if bytes_produced == 0 && bytes_consumed == 0 {
        return Ok(());
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn read_spanning_chunks_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![1, 2, 3], false).unwrap();
    stream.write(vec![4, 5], false).unwrap();

    assert_eq!(stream.read(2), Ok(vec![1, 2]));
    assert_eq!(stream.read(3), Ok(vec![3, 4, 5]));
    assert_eq!(stream.bytes_read(), 5);
  }

  #[test]
  fn peek_does_not_consume_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![1, 2], false).unwrap();
    stream.write(vec![3, 4], false).unwrap();

    assert_eq!(stream.peek(3), Ok(vec![1, 2, 3]));
    assert_eq!(stream.read(4), Ok(vec![1, 2, 3, 4]));
  }

  #[test]
  fn underflow_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![1, 2], false).unwrap();
    assert_eq!(stream.read(3), Err(ByteStreamError::DataRequired));

    stream.write(vec![], true).unwrap();
    assert_eq!(stream.read(3), Err(ByteStreamError::DataEnd));
    assert_eq!(
      stream.write(vec![5], true),
      Err(ByteStreamError::WriteAfterCompletion)
    );
  }

  #[test]
  fn zlib_inflate_test() {
    use std::io::Write;

    let mut encoder = flate2::write::DeflateEncoder::new(
      Vec::new(),
      flate2::Compression::default(),
    );
    encoder.write_all(b"streaming dicom data").unwrap();
    let deflated = encoder.finish().unwrap();

    let mut stream = ByteStream::new();
    stream.start_zlib_inflate();

    // Write the deflated bytes one at a time to exercise resumption
    let (last, rest) = deflated.split_last().unwrap();
    for byte in rest {
      stream.write(vec![*byte], false).unwrap();
    }
    stream.write(vec![*last], true).unwrap();

    assert_eq!(stream.read(20), Ok(b"streaming dicom data".to_vec()));
    assert!(stream.is_fully_consumed());
  }
}
