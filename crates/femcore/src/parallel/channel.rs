//! Byte framing for partition exchanges.
//!
//! A frame is `[step: i32][length: u32][payload]`, big-endian. Frames are
//! read back in the order they were written.

use std::collections::VecDeque;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ElementError, Result};

/// FIFO transport of step-tagged opaque frames
pub trait SyncChannel {
    /// Bytes the channel adds around each payload
    fn frame_overhead(&self) -> usize;

    /// Queue one frame
    fn write_frame(&mut self, step: i32, payload: Bytes) -> Result<()>;

    /// Take the next frame. Fails when the queue is empty or the frame
    /// belongs to another step; the frame is consumed either way.
    fn read_frame(&mut self, step: i32) -> Result<Bytes>;

    fn pending_frames(&self) -> usize;
}

/// Growable write buffer for one element's payload
#[derive(Debug, Default)]
pub struct PackBuffer {
    buf: BytesMut,
}

impl PackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Packed size of a length-prefixed slice of `len` values
    pub const fn slice_size(len: usize) -> usize {
        4 + 8 * len
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn put_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Length-prefixed slice
    pub fn put_slice(&mut self, values: &[f64]) {
        self.buf.put_u32(values.len() as u32);
        for v in values {
            self.buf.put_f64(*v);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Read cursor over a received payload
#[derive(Debug)]
pub struct UnpackBuffer {
    buf: Bytes,
}

impl UnpackBuffer {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(ElementError::Channel(format!(
                "buffer underflow: need {n} byte(s), {} left",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        self.require(8)?;
        Ok(self.buf.get_f64())
    }

    /// Length-prefixed slice written by [`PackBuffer::put_slice`]
    pub fn get_slice(&mut self) -> Result<Vec<f64>> {
        let len = self.get_u32()? as usize;
        self.require(8 * len)?;
        Ok((0..len).map(|_| self.buf.get_f64()).collect())
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

/// In-process channel; its byte stream can be handed to any transport
#[derive(Debug, Default, Clone)]
pub struct MemoryChannel {
    frames: VecDeque<Bytes>,
}

const HEADER_SIZE: usize = 8;

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate all queued frames
    pub fn into_bytes(self) -> Bytes {
        let total = self.frames.iter().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(total);
        for frame in self.frames {
            out.put(frame);
        }
        out.freeze()
    }

    /// Split a byte stream produced by [`MemoryChannel::into_bytes`] back into
    /// frames
    pub fn from_bytes(mut stream: Bytes) -> Result<Self> {
        let mut frames = VecDeque::new();
        while stream.has_remaining() {
            if stream.remaining() < HEADER_SIZE {
                return Err(ElementError::Channel("truncated frame header".into()));
            }
            let len = u32::from_be_bytes([stream[4], stream[5], stream[6], stream[7]]) as usize;
            if stream.remaining() < HEADER_SIZE + len {
                return Err(ElementError::Channel(format!(
                    "truncated frame: {} of {} payload byte(s)",
                    stream.remaining() - HEADER_SIZE,
                    len
                )));
            }
            frames.push_back(stream.split_to(HEADER_SIZE + len));
        }
        Ok(Self { frames })
    }
}

impl SyncChannel for MemoryChannel {
    fn frame_overhead(&self) -> usize {
        HEADER_SIZE
    }

    fn write_frame(&mut self, step: i32, payload: Bytes) -> Result<()> {
        let len = u32::try_from(payload.len())
            .map_err(|_| ElementError::Channel(format!("frame of {} bytes", payload.len())))?;
        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_i32(step);
        frame.put_u32(len);
        frame.put(payload);
        self.frames.push_back(frame.freeze());
        Ok(())
    }

    fn read_frame(&mut self, step: i32) -> Result<Bytes> {
        let mut frame = self
            .frames
            .pop_front()
            .ok_or_else(|| ElementError::Channel("no frame pending".into()))?;
        let tag = frame.get_i32();
        let len = frame.get_u32() as usize;
        if tag != step {
            return Err(ElementError::Channel(format!(
                "frame for step {tag} read at step {step}"
            )));
        }
        if frame.remaining() != len {
            return Err(ElementError::Channel(format!(
                "frame declares {len} byte(s), carries {}",
                frame.remaining()
            )));
        }
        Ok(frame)
    }

    fn pending_frames(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_fifo() {
        let mut ch = MemoryChannel::new();
        ch.write_frame(3, Bytes::from_static(b"ab")).unwrap();
        ch.write_frame(3, Bytes::new()).unwrap();
        assert_eq!(ch.pending_frames(), 2);
        assert_eq!(ch.read_frame(3).unwrap(), Bytes::from_static(b"ab"));
        assert!(ch.read_frame(3).unwrap().is_empty());
        assert!(ch.read_frame(3).is_err());
    }

    #[test]
    fn step_mismatch_is_rejected() {
        let mut ch = MemoryChannel::new();
        ch.write_frame(1, Bytes::from_static(b"x")).unwrap();
        assert!(matches!(ch.read_frame(2), Err(ElementError::Channel(_))));
    }

    #[test]
    fn stream_survives_byte_transport() {
        let mut ch = MemoryChannel::new();
        let mut buf = PackBuffer::new();
        buf.put_slice(&[1.5, -2.0]);
        ch.write_frame(7, buf.freeze()).unwrap();
        ch.write_frame(7, Bytes::new()).unwrap();

        let mut received = MemoryChannel::from_bytes(ch.into_bytes()).unwrap();
        assert_eq!(received.pending_frames(), 2);
        let mut payload = UnpackBuffer::new(received.read_frame(7).unwrap());
        assert_eq!(payload.get_slice().unwrap(), vec![1.5, -2.0]);
        assert_eq!(payload.remaining(), 0);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let stream = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 9, 1, 2]);
        assert!(MemoryChannel::from_bytes(stream).is_err());
    }

    #[test]
    fn unpack_underflow_is_an_error() {
        let mut buf = PackBuffer::new();
        buf.put_u32(3);
        buf.put_f64(1.0);
        let mut payload = UnpackBuffer::new(buf.freeze());
        assert!(payload.get_slice().is_err());
    }
}
