use crate::codec::Codec;
use crate::sink::ResponseSink;
use compression_codecs::EncodeV2;
use compression_core::Level;
use compression_core::util::{PartialBuffer, WriteBuffer};
use std::collections::TryReserveError;
use std::io;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// Streaming compressor that emits its output into a [`ResponseSink`].
///
/// Input is compressed strictly in submission order. Compressed bytes are
/// written to the sink as soon as the codec produces them; whatever the codec
/// holds back is only emitted by [`flush`](Self::flush) or
/// [`finish`](Self::finish).
pub(crate) struct StreamEncoder {
    encoder: Box<dyn EncodeV2 + Send>,
    output_buffer: Vec<u8>,
    finished: bool,
}

impl StreamEncoder {
    /// Creates an encoder for the given codec and level.
    pub(crate) fn new(codec: Codec, level: Level) -> Result<Self, TryReserveError> {
        let mut output_buffer = Vec::new();
        output_buffer.try_reserve_exact(OUTPUT_BUFFER_SIZE)?;
        output_buffer.resize(OUTPUT_BUFFER_SIZE, 0);

        Ok(Self {
            encoder: codec.encoder(level),
            output_buffer,
            finished: false,
        })
    }

    /// Returns whether the stream has been finished.
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Compresses `input`, writing any produced output to `sink`.
    ///
    /// Returns the number of input bytes consumed.
    pub(crate) fn write(&mut self, input: &[u8], sink: &mut dyn ResponseSink) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::other("write after compressed stream was finished"));
        }

        let mut input_buf = PartialBuffer::new(input);

        // Keep encoding until all input is consumed
        loop {
            let consumed_before = input_buf.written_len();
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());

            self.encoder.encode(&mut input_buf, &mut output)?;

            let written = output.written_len();
            if written > 0 {
                sink.write_all(&self.output_buffer[..written])?;
            }

            if input_buf.written_len() >= input.len() {
                break;
            }

            // No progress on either side, report a short write
            if written == 0 && input_buf.written_len() == consumed_before {
                break;
            }
        }

        Ok(input_buf.written_len())
    }

    /// Emits everything compressed so far, so the client can decode it.
    pub(crate) fn flush(&mut self, sink: &mut dyn ResponseSink) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }

        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.flush(&mut output)?;

            let written = output.written_len();
            if written > 0 {
                sink.write_all(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }

    /// Terminates the compressed stream, writing its trailer to `sink`.
    ///
    /// Finishing twice is a no-op.
    pub(crate) fn finish(&mut self, sink: &mut dyn ResponseSink) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        // A failed finish leaves the stream unusable either way.
        self.finished = true;

        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.finish(&mut output)?;

            let written = output.written_len();
            if written > 0 {
                sink.write_all(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }
}
