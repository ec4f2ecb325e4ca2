use std::time::Duration;

use crate::foundation::core::{NodeId, Vec3};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::foundation::math::BoundingBox;
use crate::process::pipeline::{DrawCommand, Pipeline};

/// Whether a view shows flat image planes or volumes in space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    TwoD,
    ThreeD,
}

/// An ordered group of renderer nodes drawn together.
///
/// The view owns no nodes. It only records renderer ids of one [`Pipeline`] and drives them.
#[derive(Clone, Debug)]
pub struct View {
    renderers: Vec<NodeId>,
    mode: ViewMode,
    max_fps: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            renderers: Vec::new(),
            mode: ViewMode::TwoD,
            max_fps: 60.0,
        }
    }
}

impl View {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Adding the same renderer twice is a no-op.
    pub fn add_renderer(&mut self, renderer: NodeId) {
        if !self.renderers.contains(&renderer) {
            self.renderers.push(renderer);
        }
    }

    pub fn remove_renderer(&mut self, renderer: NodeId) -> bool {
        let before = self.renderers.len();
        self.renderers.retain(|r| *r != renderer);
        self.renderers.len() != before
    }

    pub fn renderers(&self) -> &[NodeId] {
        &self.renderers
    }

    pub fn maximum_framerate(&self) -> f64 {
        self.max_fps
    }

    pub fn set_maximum_framerate(&mut self, fps: f64) -> MedflowResult<()> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MedflowError::config(format!(
                "maximum framerate must be > 0, got {fps}"
            )));
        }
        self.max_fps = fps;
        Ok(())
    }

    /// Minimum time between two redraws.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.max_fps)
    }

    /// Update every renderer in one pass, so renderers sharing a stream see the same frame.
    /// Stops at the first failure.
    pub fn update(&self, pipeline: &mut Pipeline) -> MedflowResult<()> {
        pipeline.update_nodes(&self.renderers)
    }

    /// Draw commands for every renderer that has produced a texture.
    pub fn draw(&self, pipeline: &Pipeline) -> Vec<DrawCommand> {
        self.renderers
            .iter()
            .filter_map(|&r| pipeline.draw(r))
            .collect()
    }

    /// World-space union of what the renderers show, or `None` when nothing is connected.
    ///
    /// In [`ViewMode::TwoD`] the box is flattened onto `z = 0`.
    pub fn bounding_box(&self, pipeline: &Pipeline) -> MedflowResult<Option<BoundingBox>> {
        let mut acc: Option<BoundingBox> = None;
        for &renderer in &self.renderers {
            let Some(shown) = pipeline.node_input(renderer, "input")? else {
                continue;
            };
            let bb = pipeline.bounding_box(shown)?;
            acc = Some(match acc {
                Some(a) => a.union(&bb),
                None => bb,
            });
        }
        Ok(acc.map(|bb| match self.mode {
            ViewMode::TwoD => {
                let (min, max) = (bb.min(), bb.max());
                BoundingBox::new(
                    Vec3::new(min.x, min.y, 0.0),
                    Vec3::new(max.x - min.x, max.y - min.y, 0.0),
                )
            }
            ViewMode::ThreeD => bb,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/view.rs"]
mod tests;
