use crate::foundation::error::{MedflowError, MedflowResult};
use crate::io::sequence::FilenameFormat;
use crate::nodes::{int_param, text_param};
use crate::process::context::ExecContext;
use crate::process::node::{OutputMode, ParamValue, ProcessObject, Produced, unknown_parameter};

/// Streams numbered image files: `#` in the format is replaced by `start_index`,
/// `start_index + 1`, ... until a file is missing or `max_frames` were read.
///
/// `.mhd`/`.mha` files are read as MetaImage, anything else as raster.
#[derive(Clone, Debug, Default)]
pub struct ImageFileStreamer {
    format: Option<FilenameFormat>,
    start_index: u64,
    max_frames: Option<u64>,
    produced: u64,
}

impl ImageFileStreamer {
    pub fn new(filename_format: &str) -> MedflowResult<Self> {
        Ok(Self {
            format: Some(FilenameFormat::new(filename_format)?),
            ..Self::default()
        })
    }

    pub fn with_start_index(mut self, start: u64) -> Self {
        self.start_index = start;
        self
    }

    pub fn with_max_frames(mut self, max: u64) -> Self {
        self.max_frames = Some(max);
        self
    }

    /// Frames read since the last parameter change.
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl ProcessObject for ImageFileStreamer {
    fn kind(&self) -> &'static str {
        "image_file_streamer"
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Stream
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        match name {
            "filename_format" => {
                self.format = Some(FilenameFormat::new(text_param(self.kind(), name, value)?)?);
            }
            "start_index" => {
                let v = int_param(self.kind(), name, value)?;
                self.start_index = u64::try_from(v)
                    .map_err(|_| MedflowError::config("start_index must be >= 0"))?;
            }
            "max_frames" => {
                let v = int_param(self.kind(), name, value)?;
                self.max_frames = match v {
                    -1 => None,
                    v if v >= 1 => Some(v as u64),
                    _ => {
                        return Err(MedflowError::config(
                            "max_frames must be >= 1, or -1 for no limit",
                        ));
                    }
                };
            }
            _ => return Err(unknown_parameter(self.kind(), name)),
        }
        self.produced = 0;
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            "filename_format" => self
                .format
                .as_ref()
                .map(|f| ParamValue::Text(f.pattern().to_string())),
            "start_index" => Some(ParamValue::Int(self.start_index as i64)),
            "max_frames" => Some(ParamValue::Int(self.max_frames.map_or(-1, |m| m as i64))),
            _ => None,
        }
    }

    fn execute(&mut self, _ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        let format = self
            .format
            .as_ref()
            .ok_or_else(|| MedflowError::config("image_file_streamer needs a filename_format"))?;
        if self.max_frames.is_some_and(|max| self.produced >= max) {
            return Ok(Produced::EndOfStream);
        }
        let path = format.path(self.start_index + self.produced);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no further frame file");
            return Ok(Produced::EndOfStream);
        }
        let frame = crate::io::read_image(&path)?;
        self.produced += 1;
        Ok(frame.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/streamer.rs"]
mod tests;
