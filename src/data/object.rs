use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::image::{Image, Texture};
use crate::data::stream::StreamingBuffer;
use crate::foundation::core::{NodeId, Version};
use crate::foundation::error::{MedflowError, MedflowResult};

/// Content a node can publish as a static output.
#[derive(Clone, Debug)]
pub enum Data {
    Image(Arc<Image>),
    Texture(Arc<Texture>),
}

impl Data {
    pub fn as_image(&self) -> Option<&Arc<Image>> {
        match self {
            Data::Image(img) => Some(img),
            Data::Texture(_) => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Arc<Texture>> {
        match self {
            Data::Texture(tex) => Some(tex),
            Data::Image(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Data::Image(_) => "image",
            Data::Texture(_) => "texture",
        }
    }
}

impl From<Image> for Data {
    fn from(img: Image) -> Self {
        Data::Image(Arc::new(img))
    }
}

impl From<Texture> for Data {
    fn from(tex: Texture) -> Self {
        Data::Texture(Arc::new(tex))
    }
}

/// What a data object currently holds.
#[derive(Clone, Debug)]
pub enum DataContent {
    /// Nothing has been published yet.
    Empty,
    Static(Data),
    Dynamic(StreamingBuffer),
}

/// Cached, versioned output of exactly one process node.
///
/// The producer owns the content; consumers are plain back-references used to propagate
/// modification marks.
#[derive(Clone, Debug)]
pub struct DataObject {
    pub(crate) producer: NodeId,
    pub(crate) consumers: BTreeSet<NodeId>,
    pub(crate) version: Version,
    pub(crate) content: DataContent,
}

impl DataObject {
    pub(crate) fn new(producer: NodeId) -> Self {
        Self {
            producer,
            consumers: BTreeSet::new(),
            version: Version::INITIAL,
            content: DataContent::Empty,
        }
    }

    pub fn producer(&self) -> NodeId {
        self.producer
    }

    pub fn consumers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.consumers.iter().copied()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn content(&self) -> &DataContent {
        &self.content
    }

    /// Whether content has ever been produced.
    pub fn is_valid(&self) -> bool {
        match &self.content {
            DataContent::Empty => false,
            DataContent::Static(_) => true,
            DataContent::Dynamic(buf) => buf.produced() > 0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.content, DataContent::Dynamic(_))
    }

    pub fn stream(&self) -> Option<&StreamingBuffer> {
        match &self.content {
            DataContent::Dynamic(buf) => Some(buf),
            _ => None,
        }
    }

    pub(crate) fn stream_mut(&mut self) -> Option<&mut StreamingBuffer> {
        match &mut self.content {
            DataContent::Dynamic(buf) => Some(buf),
            _ => None,
        }
    }

    /// Static content, failing with [`MedflowError::InvalidInput`] when never produced.
    pub fn data(&self) -> MedflowResult<&Data> {
        match &self.content {
            DataContent::Static(data) => Ok(data),
            DataContent::Empty => Err(MedflowError::invalid_input(format!(
                "output of {} has not been produced",
                self.producer
            ))),
            DataContent::Dynamic(_) => Err(MedflowError::invalid_input(format!(
                "output of {} is a stream; pull frames with next_frame",
                self.producer
            ))),
        }
    }

    /// Newest image held: the static image, or the most recent streamed frame.
    pub fn latest_image(&self) -> Option<&Arc<Image>> {
        match &self.content {
            DataContent::Static(Data::Image(img)) => Some(img),
            DataContent::Dynamic(buf) => buf.latest(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/object.rs"]
mod tests;
