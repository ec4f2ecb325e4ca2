use std::sync::Arc;

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::process::context::ExecContext;
use crate::process::node::{OutputMode, ProcessObject, Produced};

/// Publishes one in-memory image.
#[derive(Clone, Debug)]
pub struct ImageSource {
    image: Arc<Image>,
}

impl ImageSource {
    pub fn new(image: impl Into<Arc<Image>>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

impl ProcessObject for ImageSource {
    fn kind(&self) -> &'static str {
        "image_source"
    }

    fn execute(&mut self, _ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        Ok(Arc::clone(&self.image).into())
    }
}

/// Streams in-memory frames in order, then reports end of stream.
#[derive(Clone, Debug)]
pub struct ImageSequenceSource {
    frames: Vec<Arc<Image>>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn new(frames: impl IntoIterator<Item = Image>) -> MedflowResult<Self> {
        let frames: Vec<Arc<Image>> = frames.into_iter().map(Arc::new).collect();
        if frames.is_empty() {
            return Err(MedflowError::config("image sequence needs at least one frame"));
        }
        Ok(Self { frames, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl ProcessObject for ImageSequenceSource {
    fn kind(&self) -> &'static str {
        "image_sequence_source"
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Stream
    }

    fn execute(&mut self, _ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        match self.frames.get(self.next) {
            Some(frame) => {
                self.next += 1;
                Ok(Arc::clone(frame).into())
            }
            None => Ok(Produced::EndOfStream),
        }
    }
}
