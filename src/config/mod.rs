//! JSON pipeline descriptions.
//!
//! ```json
//! {
//!   "device": { "prefer_gpu": false },
//!   "nodes": [
//!     { "id": "frames", "kind": "image_file_streamer",
//!       "params": { "filename_format": "us_#.mhd" }, "stream_capacity": 2 },
//!     { "id": "smooth", "kind": "gaussian_smoothing", "inputs": { "input": "frames" } }
//!   ],
//!   "update": ["smooth"],
//!   "updates": 10
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::device::registry::DeviceRegistry;
use crate::foundation::core::NodeId;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::nodes::create_node;
use crate::process::node::ParamValue;
use crate::process::pipeline::{NodeStats, Pipeline};

/// Parameters holding paths; relative values resolve against the description's directory.
const PATH_PARAMS: &[&str] = &["filename", "filename_format"];

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    pub nodes: Vec<NodeConfig>,
    /// Nodes pulled on every round, in order.
    #[serde(default)]
    pub update: Vec<String>,
    /// Number of update rounds.
    #[serde(default = "default_updates")]
    pub updates: u32,
}

fn default_updates() -> u32 {
    1
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    #[serde(default)]
    pub prefer_gpu: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,
    /// Input slot name to producing node id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_capacity: Option<usize>,
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> MedflowResult<Self> {
        serde_json::from_str(text).map_err(|e| MedflowError::serde(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> MedflowResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MedflowError::serde(e.to_string()))
    }

    /// Structural checks that need no devices: unique ids, known references, `updates >= 1`.
    pub fn validate(&self) -> MedflowResult<()> {
        if self.updates == 0 {
            return Err(MedflowError::config("updates must be >= 1"));
        }
        let mut ids = BTreeSet::new();
        for n in &self.nodes {
            if n.id.trim().is_empty() {
                return Err(MedflowError::config("node id must be non-empty"));
            }
            if !ids.insert(n.id.as_str()) {
                return Err(MedflowError::config(format!("duplicate node id '{}'", n.id)));
            }
        }
        for n in &self.nodes {
            for (slot, from) in &n.inputs {
                if !ids.contains(from.as_str()) {
                    return Err(MedflowError::config(format!(
                        "node '{}' input '{slot}' references unknown node '{from}'",
                        n.id
                    )));
                }
            }
        }
        for id in &self.update {
            if !ids.contains(id.as_str()) {
                return Err(MedflowError::config(format!(
                    "update references unknown node '{id}'"
                )));
            }
        }
        Ok(())
    }

    /// Construct every node, apply parameters, then wire inputs.
    ///
    /// Relative path parameters are resolved against `root`.
    #[tracing::instrument(skip(self, devices), fields(nodes = self.nodes.len()))]
    pub fn build(&self, devices: Arc<DeviceRegistry>, root: &Path) -> MedflowResult<BuiltPipeline> {
        self.validate()?;
        if self.device.prefer_gpu {
            let device = devices.get_one_gpu_device(true)?;
            tracing::info!(device = device.name(), "default device");
            devices.set_default_device(device);
        }

        let mut pipeline = Pipeline::new(devices);
        let mut ids = BTreeMap::new();
        for n in &self.nodes {
            let params = n
                .params
                .iter()
                .map(|(k, v)| (k.clone(), resolve_path(k, v, root)))
                .collect();
            let process = create_node(&n.kind, &params)
                .map_err(|e| MedflowError::config(format!("node '{}': {e}", n.id)))?;
            let node = pipeline.add_boxed(process)?;
            if let Some(k) = n.stream_capacity {
                pipeline.set_stream_capacity(node, k)?;
            }
            ids.insert(n.id.clone(), node);
        }
        for n in &self.nodes {
            let node = ids[&n.id];
            for (slot, from) in &n.inputs {
                let data = pipeline.output(ids[from])?;
                pipeline.set_input(node, slot, data)?;
            }
        }

        let update = self.update.iter().map(|id| ids[id]).collect();
        Ok(BuiltPipeline {
            pipeline,
            nodes: ids,
            update,
            updates: self.updates,
        })
    }
}

fn resolve_path(name: &str, value: &ParamValue, root: &Path) -> ParamValue {
    match value {
        ParamValue::Text(s) if PATH_PARAMS.contains(&name) && Path::new(s).is_relative() => {
            ParamValue::Text(root.join(s).to_string_lossy().into_owned())
        }
        other => other.clone(),
    }
}

/// A pipeline built from a [`PipelineConfig`], with its node ids by name.
#[derive(Debug)]
pub struct BuiltPipeline {
    pub pipeline: Pipeline,
    pub nodes: BTreeMap<String, NodeId>,
    pub update: Vec<NodeId>,
    pub updates: u32,
}

/// Outcome of [`BuiltPipeline::run`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RunReport {
    /// Rounds that completed.
    pub rounds: u32,
    /// True when a round stopped because a stream ran out.
    pub exhausted: bool,
    pub nodes: BTreeMap<String, NodeStats>,
}

impl BuiltPipeline {
    pub fn node(&self, id: &str) -> MedflowResult<NodeId> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| MedflowError::invalid_input(format!("no node named '{id}'")))
    }

    /// Run `updates` rounds over the update list.
    ///
    /// Streaming targets hand out one frame per round. A round that hits the end of a stream
    /// ends the run early; any other error is returned.
    pub fn run(&mut self) -> MedflowResult<RunReport> {
        self.run_rounds(self.updates)
    }

    pub fn run_rounds(&mut self, rounds: u32) -> MedflowResult<RunReport> {
        let mut done = 0;
        let mut exhausted = false;
        let targets = self.update.clone();
        for round in 0..rounds {
            match self.round(&targets) {
                Ok(()) => done += 1,
                Err(e) if e.is_stream_exhausted() => {
                    tracing::info!(round, "stream exhausted, stopping");
                    exhausted = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(RunReport {
            rounds: done,
            exhausted,
            nodes: self.stats()?,
        })
    }

    /// Update every target in one pass; dynamic outputs are then consumed so streams keep
    /// flowing.
    fn round(&mut self, targets: &[NodeId]) -> MedflowResult<()> {
        self.pipeline.update_nodes(targets)?;
        for &node in targets {
            let output = self.pipeline.output(node)?;
            if self.pipeline.data_object(output)?.is_dynamic() {
                self.pipeline.next_frame(output)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> MedflowResult<BTreeMap<String, NodeStats>> {
        self.nodes
            .iter()
            .map(|(id, &node)| Ok((id.clone(), self.pipeline.stats(node)?)))
            .collect()
    }
}

/// Directory that relative paths in the description at `path` resolve against.
pub fn config_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/mod.rs"]
mod tests;
