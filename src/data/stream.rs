use std::collections::VecDeque;
use std::sync::Arc;

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};

/// Bounded buffer of frames for a dynamic data object.
///
/// Frames carry absolute indices: `frames[i]` has index `first_index + i`. The cursor is the
/// absolute index of the next frame to hand out and never decreases. At most `capacity` frames
/// are buffered, and a frame is only evicted after it has been consumed.
#[derive(Clone, Debug)]
pub struct StreamingBuffer {
    frames: VecDeque<Arc<Image>>,
    first_index: u64,
    cursor: u64,
    capacity: usize,
    exhausted: bool,
}

impl StreamingBuffer {
    pub fn new(capacity: usize) -> MedflowResult<Self> {
        if capacity == 0 {
            return Err(MedflowError::config("stream capacity must be >= 1"));
        }
        Ok(Self {
            frames: VecDeque::with_capacity(capacity),
            first_index: 0,
            cursor: 0,
            capacity,
            exhausted: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute index of the next frame to deliver.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Total frames ever appended.
    pub fn produced(&self) -> u64 {
        self.first_index + self.frames.len() as u64
    }

    pub fn buffered(&self) -> usize {
        self.frames.len()
    }

    /// Buffered frames not yet handed out.
    pub fn unconsumed(&self) -> usize {
        (self.produced() - self.cursor) as usize
    }

    /// True when appending would require evicting an unconsumed frame.
    pub fn is_full(&self) -> bool {
        self.unconsumed() >= self.capacity
    }

    /// Most recently produced frame, without moving the cursor.
    pub fn latest(&self) -> Option<&Arc<Image>> {
        self.frames.back()
    }

    pub(crate) fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// Hand out the frame at the cursor, if buffered, and advance.
    pub fn take_next(&mut self) -> Option<Arc<Image>> {
        if self.cursor >= self.produced() {
            return None;
        }
        let offset = (self.cursor - self.first_index) as usize;
        let frame = self.frames.get(offset).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        frame
    }

    /// Append a produced frame, evicting the oldest consumed frames to stay within capacity.
    ///
    /// Fails when the buffer already holds `capacity` unconsumed frames; callers check
    /// [`StreamingBuffer::is_full`] before producing.
    pub fn push(&mut self, frame: Arc<Image>) -> MedflowResult<()> {
        if self.exhausted {
            return Err(MedflowError::stream_exhausted(
                "cannot append to an exhausted stream",
            ));
        }
        if self.is_full() {
            return Err(MedflowError::unsupported(
                "stream buffer is full of unconsumed frames",
            ));
        }
        self.evict_consumed(self.capacity - 1);
        self.frames.push_back(frame);
        debug_assert!(self.frames.len() <= self.capacity);
        Ok(())
    }

    /// Change capacity; only consumed frames are evicted when shrinking.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> MedflowResult<()> {
        if capacity == 0 {
            return Err(MedflowError::config("stream capacity must be >= 1"));
        }
        if self.unconsumed() > capacity {
            return Err(MedflowError::config(format!(
                "cannot shrink stream to {capacity}: {} frames are unconsumed",
                self.unconsumed()
            )));
        }
        self.capacity = capacity;
        self.evict_consumed(capacity);
        Ok(())
    }

    fn evict_consumed(&mut self, keep_at_most: usize) {
        while self.frames.len() > keep_at_most && self.first_index < self.cursor {
            self.frames.pop_front();
            self.first_index += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/stream.rs"]
mod tests;
