use std::collections::HashMap;
use std::sync::Arc;

use crate::data::image::{Image, Texture};
use crate::data::object::{Data, DataContent, DataObject};
use crate::data::stream::StreamingBuffer;
use crate::device::device::Device;
use crate::device::registry::DeviceRegistry;
use crate::foundation::core::{Affine3A, DataId, NodeId, Vec3, Version};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::foundation::math::BoundingBox;
use crate::process::context::ExecContext;
use crate::process::node::{DeviceRole, OutputMode, ParamValue, ProcessObject, Produced};
use crate::scene::graph::{SceneGraph, SceneNode};

/// Per-node counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct NodeStats {
    pub executions: u64,
    pub failures: u64,
    /// Updates that skipped production because the output buffer was full.
    pub backpressure_skips: u64,
    /// Input images moved from another device.
    pub transfers: u64,
}

/// What a renderer last produced, ready to be drawn.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub node: NodeId,
    pub texture: Arc<Texture>,
    /// World transform of the data the texture depicts.
    pub transform: Affine3A,
}

#[derive(Debug)]
struct InputSlot {
    name: &'static str,
    source: Option<DataId>,
    /// `(source, version)` observed at the last successful execution.
    seen: Option<(DataId, Version)>,
}

struct NodeEntry {
    kind: &'static str,
    declared: OutputMode,
    process: Option<Box<dyn ProcessObject>>,
    inputs: Vec<InputSlot>,
    output: DataId,
    modified: bool,
    device: Arc<Device>,
    stream_capacity: usize,
    stats: NodeStats,
    /// Pass in which the node was last pulled or executed.
    pulled: u64,
}

impl NodeEntry {
    fn slot(&self, name: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|s| s.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut InputSlot> {
        self.inputs.iter_mut().find(|s| s.name == name)
    }

    fn sources(&self) -> Vec<DataId> {
        self.inputs.iter().filter_map(|s| s.source).collect()
    }
}

/// One top-level pull. Every node runs at most once per pass, and all readers of a stream
/// within the pass see the same frame.
#[derive(Debug, Default)]
struct Pass {
    epoch: u64,
    frames: HashMap<DataId, Arc<Image>>,
}

/// Arena of process nodes and their cached outputs, evaluated on demand.
///
/// Every node owns exactly one output [`DataObject`]. [`Pipeline::update`] pulls: it brings the
/// producers of a node's inputs up to date first, then re-executes the node only when an input
/// version moved, the node was modified, or its output was never produced.
pub struct Pipeline {
    devices: Arc<DeviceRegistry>,
    nodes: Vec<Option<NodeEntry>>,
    objects: Vec<Option<DataObject>>,
    scene: SceneGraph,
    pass: Pass,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("nodes", &self.node_ids().count())
            .field("scene", &self.scene.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(devices: Arc<DeviceRegistry>) -> Self {
        Self {
            devices,
            nodes: Vec::new(),
            objects: Vec::new(),
            scene: SceneGraph::new(),
            pass: Pass::default(),
        }
    }

    pub fn devices(&self) -> &Arc<DeviceRegistry> {
        &self.devices
    }

    /// Add a node bound to the registry's default device (or the visualization device for
    /// renderers).
    pub fn add_node(&mut self, process: impl ProcessObject + 'static) -> MedflowResult<NodeId> {
        self.add_boxed(Box::new(process))
    }

    /// Add a node bound to `device`.
    pub fn add_node_on(
        &mut self,
        process: impl ProcessObject + 'static,
        device: Arc<Device>,
    ) -> MedflowResult<NodeId> {
        self.add_boxed_on(Box::new(process), device)
    }

    /// Add an already boxed node, as built by [`crate::nodes::create_node`].
    pub fn add_boxed(&mut self, process: Box<dyn ProcessObject>) -> MedflowResult<NodeId> {
        let device = match process.device_role() {
            DeviceRole::Compute => self.devices.default_device()?,
            DeviceRole::Visualization => self.devices.default_visualization_device()?,
        };
        self.add_boxed_on(process, device)
    }

    fn add_boxed_on(
        &mut self,
        process: Box<dyn ProcessObject>,
        device: Arc<Device>,
    ) -> MedflowResult<NodeId> {
        let node = NodeId(
            self.nodes
                .len()
                .try_into()
                .map_err(|_| MedflowError::config("node id overflow"))?,
        );
        let output = DataId(
            self.objects
                .len()
                .try_into()
                .map_err(|_| MedflowError::config("data id overflow"))?,
        );
        let inputs = process
            .input_slots()
            .iter()
            .map(|&name| InputSlot {
                name,
                source: None,
                seen: None,
            })
            .collect();
        tracing::debug!(%node, kind = process.kind(), device = device.name(), "added node");
        self.nodes.push(Some(NodeEntry {
            kind: process.kind(),
            declared: process.output_mode(),
            process: Some(process),
            inputs,
            output,
            modified: true,
            device,
            stream_capacity: 1,
            stats: NodeStats::default(),
            pulled: 0,
        }));
        self.objects.push(Some(DataObject::new(node)));
        Ok(node)
    }

    fn entry(&self, node: NodeId) -> MedflowResult<&NodeEntry> {
        self.nodes
            .get(node.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| MedflowError::invalid_input(format!("unknown {node}")))
    }

    fn entry_mut(&mut self, node: NodeId) -> MedflowResult<&mut NodeEntry> {
        self.nodes
            .get_mut(node.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| MedflowError::invalid_input(format!("unknown {node}")))
    }

    fn object_mut(&mut self, data: DataId) -> MedflowResult<&mut DataObject> {
        self.objects
            .get_mut(data.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| MedflowError::invalid_input(format!("unknown {data}")))
    }

    pub fn data_object(&self, data: DataId) -> MedflowResult<&DataObject> {
        self.objects
            .get(data.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| MedflowError::invalid_input(format!("unknown {data}")))
    }

    /// Ids of live nodes, in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.entry(node).is_ok()
    }

    /// The data object `node` produces.
    pub fn output(&self, node: NodeId) -> MedflowResult<DataId> {
        Ok(self.entry(node)?.output)
    }

    pub fn kind(&self, node: NodeId) -> MedflowResult<&'static str> {
        Ok(self.entry(node)?.kind)
    }

    pub fn input_slots(&self, node: NodeId) -> MedflowResult<Vec<&'static str>> {
        Ok(self.entry(node)?.inputs.iter().map(|s| s.name).collect())
    }

    /// Data object wired into `slot`, if any.
    pub fn node_input(&self, node: NodeId, slot: &str) -> MedflowResult<Option<DataId>> {
        let entry = self.entry(node)?;
        entry
            .slot(slot)
            .map(|s| s.source)
            .ok_or_else(|| unknown_slot(entry, node, slot))
    }

    pub fn is_modified(&self, node: NodeId) -> MedflowResult<bool> {
        Ok(self.entry(node)?.modified)
    }

    pub fn execution_count(&self, node: NodeId) -> MedflowResult<u64> {
        Ok(self.entry(node)?.stats.executions)
    }

    pub fn stats(&self, node: NodeId) -> MedflowResult<NodeStats> {
        Ok(self.entry(node)?.stats)
    }

    pub fn node_device(&self, node: NodeId) -> MedflowResult<&Arc<Device>> {
        Ok(&self.entry(node)?.device)
    }

    pub(crate) fn note_transfer(&mut self, node: NodeId) {
        if let Ok(entry) = self.entry_mut(node) {
            entry.stats.transfers += 1;
        }
    }

    /// Wire `data` into `slot` of `node`. Marks the node modified; never executes.
    pub fn set_input(&mut self, node: NodeId, slot: &str, data: DataId) -> MedflowResult<()> {
        self.node_input(node, slot)?;
        let producer = self.data_object(data)?.producer;
        if self.depends_on(producer, node)? {
            return Err(MedflowError::config(format!(
                "connecting {data} into {node}.{slot} would create a cycle"
            )));
        }
        let previous = self.replace_slot(node, slot, Some(data))?;
        if let Some(prev) = previous.filter(|&p| p != data) {
            self.drop_consumer(prev, node);
        }
        self.object_mut(data)?.consumers.insert(node);
        tracing::debug!(%node, slot, %data, "input connected");
        Ok(())
    }

    /// Clear `slot` of `node`. Marks the node modified.
    pub fn disconnect_input(&mut self, node: NodeId, slot: &str) -> MedflowResult<()> {
        if let Some(prev) = self.replace_slot(node, slot, None)? {
            self.drop_consumer(prev, node);
        }
        Ok(())
    }

    fn replace_slot(
        &mut self,
        node: NodeId,
        slot: &str,
        source: Option<DataId>,
    ) -> MedflowResult<Option<DataId>> {
        let entry = self.entry_mut(node)?;
        let Some(s) = entry.slot_mut(slot) else {
            return Err(unknown_slot(entry, node, slot));
        };
        let previous = std::mem::replace(&mut s.source, source);
        entry.modified = true;
        Ok(previous)
    }

    fn drop_consumer(&mut self, data: DataId, node: NodeId) {
        let still_reads = self
            .entry(node)
            .map(|e| e.inputs.iter().any(|s| s.source == Some(data)))
            .unwrap_or(false);
        if still_reads {
            return;
        }
        if let Ok(obj) = self.object_mut(data) {
            obj.consumers.remove(&node);
        }
    }

    /// Whether `node` is `target` or reads from it, directly or transitively.
    fn depends_on(&self, node: NodeId, target: NodeId) -> MedflowResult<bool> {
        let mut stack = vec![node];
        let mut visited = std::collections::BTreeSet::new();
        while let Some(n) = stack.pop() {
            if n == target {
                return Ok(true);
            }
            if !visited.insert(n) {
                continue;
            }
            for data in self.entry(n)?.sources() {
                stack.push(self.data_object(data)?.producer);
            }
        }
        Ok(false)
    }

    /// Forward a named parameter to the node. Marks it modified on success; never executes.
    pub fn set_parameter(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> MedflowResult<()> {
        let value = value.into();
        let entry = self.entry_mut(node)?;
        let process = entry
            .process
            .as_mut()
            .ok_or_else(|| MedflowError::config(format!("{node} is executing")))?;
        process.set_parameter(name, &value)?;
        entry.modified = true;
        tracing::debug!(%node, name, ?value, "parameter set");
        Ok(())
    }

    pub fn parameter(&self, node: NodeId, name: &str) -> MedflowResult<Option<ParamValue>> {
        Ok(self
            .entry(node)?
            .process
            .as_ref()
            .and_then(|p| p.parameter(name)))
    }

    /// Capacity of `node`'s output buffer when its output is dynamic. Shrinking evicts only
    /// consumed frames.
    pub fn set_stream_capacity(&mut self, node: NodeId, capacity: usize) -> MedflowResult<()> {
        if capacity == 0 {
            return Err(MedflowError::config("stream capacity must be >= 1"));
        }
        let output = self.entry(node)?.output;
        if let Some(buf) = self.object_mut(output)?.stream_mut() {
            buf.set_capacity(capacity)?;
        }
        self.entry_mut(node)?.stream_capacity = capacity;
        Ok(())
    }

    /// Remove `node` and its output. Consumers reading the output are disconnected and marked
    /// modified. Ids are not reused.
    pub fn remove_node(&mut self, node: NodeId) -> MedflowResult<()> {
        let entry = self.entry(node)?;
        if entry.process.is_none() {
            return Err(MedflowError::config(format!("{node} is executing")));
        }
        let output = entry.output;
        let sources = entry.sources();
        for data in sources {
            if let Ok(obj) = self.object_mut(data) {
                obj.consumers.remove(&node);
            }
        }
        let consumers: Vec<NodeId> = self.data_object(output)?.consumers().collect();
        for consumer in consumers {
            if let Ok(c) = self.entry_mut(consumer) {
                for slot in c.inputs.iter_mut().filter(|s| s.source == Some(output)) {
                    slot.source = None;
                }
                c.modified = true;
            }
        }
        self.objects[output.0 as usize] = None;
        self.nodes[node.0 as usize] = None;
        self.scene.remove(output);
        tracing::debug!(%node, %output, "removed node");
        Ok(())
    }

    /// Bring `data` up to date by updating its producer.
    pub fn update(&mut self, data: DataId) -> MedflowResult<()> {
        let producer = self.data_object(data)?.producer;
        self.update_node(producer)
    }

    /// Pull-update `node`: update its inputs' producers, then execute if stale.
    pub fn update_node(&mut self, node: NodeId) -> MedflowResult<()> {
        self.begin_pass();
        self.pull(node)
    }

    /// Update several nodes in one pass, stopping at the first error. Upstream nodes they
    /// share run at most once.
    pub fn update_nodes(&mut self, nodes: &[NodeId]) -> MedflowResult<()> {
        self.begin_pass();
        for &node in nodes {
            self.pull(node)?;
        }
        Ok(())
    }

    fn begin_pass(&mut self) {
        self.pass.epoch += 1;
        self.pass.frames.clear();
    }

    #[tracing::instrument(level = "debug", skip(self, node), fields(node = %node))]
    fn pull(&mut self, node: NodeId) -> MedflowResult<()> {
        let epoch = self.pass.epoch;
        let entry = self.entry_mut(node)?;
        if entry.pulled == epoch {
            tracing::trace!("already pulled in this pass");
            return Ok(());
        }
        entry.pulled = epoch;
        self.update_inputs(node)?;

        let mode = self.resolve_mode(node)?;
        let fresh = self.needs_fresh_content(node, mode)?;
        if !fresh {
            if mode == OutputMode::FollowInputs && self.inputs_drained(node)? {
                let output = self.entry(node)?.output;
                self.mark_exhausted(output)?;
            }
            if !self.is_stale(node, mode)? {
                tracing::trace!("cache hit");
                return Ok(());
            }
            if mode.is_dynamic() {
                let output = self.entry(node)?.output;
                let buf = self.stream(output)?;
                if buf.is_exhausted() {
                    return Ok(());
                }
                if buf.is_full() {
                    self.entry_mut(node)?.stats.backpressure_skips += 1;
                    tracing::debug!("output buffer full, production deferred");
                    return Ok(());
                }
            }
        }
        self.execute_node(node, mode, fresh)
    }

    fn update_inputs(&mut self, node: NodeId) -> MedflowResult<()> {
        for data in self.entry(node)?.sources() {
            let producer = self.data_object(data)?.producer;
            self.pull(producer)?;
        }
        Ok(())
    }

    /// Declared mode with `FollowInputs` resolved against the current wiring: it stays
    /// `FollowInputs` when some input is dynamic and becomes `Static` otherwise.
    fn resolve_mode(&self, node: NodeId) -> MedflowResult<OutputMode> {
        let entry = self.entry(node)?;
        match entry.declared {
            OutputMode::FollowInputs => {
                for data in entry.sources() {
                    let producer = self.data_object(data)?.producer;
                    if self.resolve_mode(producer)?.is_dynamic() {
                        return Ok(OutputMode::FollowInputs);
                    }
                }
                Ok(OutputMode::Static)
            }
            declared => Ok(declared),
        }
    }

    /// Whether the next publish must replace the output content rather than extend it: the
    /// content no longer matches `mode`, or a modified stream source restarts after exhaustion.
    /// The old content stays readable until that publish succeeds.
    fn needs_fresh_content(&self, node: NodeId, mode: OutputMode) -> MedflowResult<bool> {
        let entry = self.entry(node)?;
        let obj = self.data_object(entry.output)?;
        Ok(match (&obj.content, mode.is_dynamic()) {
            (DataContent::Dynamic(buf), true) => {
                mode == OutputMode::Stream && entry.modified && buf.is_exhausted()
            }
            (DataContent::Dynamic(_), false) => true,
            (DataContent::Static(_), true) | (DataContent::Empty, true) => true,
            (DataContent::Static(_), false) | (DataContent::Empty, false) => false,
        })
    }

    fn is_stale(&self, node: NodeId, mode: OutputMode) -> MedflowResult<bool> {
        let entry = self.entry(node)?;
        let out = self.data_object(entry.output)?;
        if entry.modified || !out.is_valid() {
            return Ok(true);
        }
        if mode == OutputMode::Stream {
            return Ok(!out.stream().is_some_and(StreamingBuffer::is_exhausted));
        }
        for slot in &entry.inputs {
            let current = match slot.source {
                Some(d) => Some((d, self.data_object(d)?.version)),
                None => None,
            };
            if current != slot.seen {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True when every dynamic input is exhausted and fully consumed.
    fn inputs_drained(&self, node: NodeId) -> MedflowResult<bool> {
        let mut any_dynamic = false;
        for data in self.entry(node)?.sources() {
            if let Some(buf) = self.data_object(data)?.stream() {
                any_dynamic = true;
                if !buf.is_exhausted() || buf.unconsumed() > 0 {
                    return Ok(false);
                }
            }
        }
        Ok(any_dynamic)
    }

    fn stream(&self, data: DataId) -> MedflowResult<&StreamingBuffer> {
        self.data_object(data)?
            .stream()
            .ok_or_else(|| MedflowError::unsupported(format!("{data} is not a stream")))
    }

    fn mark_exhausted(&mut self, data: DataId) -> MedflowResult<()> {
        if let Some(buf) = self.object_mut(data)?.stream_mut() {
            buf.mark_exhausted();
        }
        Ok(())
    }

    fn execute_node(&mut self, node: NodeId, mode: OutputMode, fresh: bool) -> MedflowResult<()> {
        let epoch = self.pass.epoch;
        let entry = self.entry_mut(node)?;
        let mut process = entry.process.take().ok_or_else(|| {
            MedflowError::config(format!("{node} was re-entered during its own execution"))
        })?;
        entry.pulled = epoch;
        let device = Arc::clone(&entry.device);
        let output = entry.output;
        let kind = entry.kind;

        let result = {
            let mut ctx = ExecContext::new(self, node, Arc::clone(&device));
            process.execute(&mut ctx)
        };
        self.entry_mut(node)?.process = Some(process);

        match result {
            Ok(Produced::Data(data)) => self.publish(node, output, data, mode, fresh, &device),
            Ok(Produced::EndOfStream) => {
                if !mode.is_dynamic() {
                    return Err(MedflowError::unsupported(format!(
                        "{kind} ({node}) reported end of stream on a static output"
                    )));
                }
                self.end_stream(node, output, fresh)?;
                tracing::debug!(%node, kind, "end of stream");
                Ok(())
            }
            Err(err) if err.is_stream_exhausted() && mode.is_dynamic() => {
                self.end_stream(node, output, fresh)?;
                tracing::debug!(%node, kind, "input stream exhausted");
                Err(err)
            }
            Err(err) if err.is_stream_exhausted() => Err(err),
            Err(err) => {
                self.entry_mut(node)?.stats.failures += 1;
                tracing::warn!(%node, kind, %err, "execution failed");
                Err(err)
            }
        }
    }

    /// Mark the output stream finished, starting from an empty buffer when the old content is
    /// being replaced.
    fn end_stream(&mut self, node: NodeId, output: DataId, fresh: bool) -> MedflowResult<()> {
        if fresh {
            let capacity = self.entry(node)?.stream_capacity;
            self.object_mut(output)?.content = DataContent::Dynamic(StreamingBuffer::new(capacity)?);
        }
        self.mark_exhausted(output)?;
        self.record_seen(node)?;
        self.entry_mut(node)?.modified = false;
        Ok(())
    }

    fn publish(
        &mut self,
        node: NodeId,
        output: DataId,
        data: Data,
        mode: OutputMode,
        fresh: bool,
        device: &Device,
    ) -> MedflowResult<()> {
        let data = match data {
            Data::Image(img) if img.location() != Some(device.id()) => {
                Data::Image(Arc::new(Arc::unwrap_or_clone(img).located_on(device.id())))
            }
            other => other,
        };
        let capacity = self.entry(node)?.stream_capacity;
        let obj = self.object_mut(output)?;
        if mode.is_dynamic() {
            let frame = match data {
                Data::Image(frame) => frame,
                other => {
                    return Err(MedflowError::unsupported(format!(
                        "{node} produced a {} but streams carry images",
                        other.kind_name()
                    )));
                }
            };
            if fresh {
                let mut buf = StreamingBuffer::new(capacity)?;
                buf.push(frame)?;
                obj.content = DataContent::Dynamic(buf);
            } else {
                obj.stream_mut()
                    .ok_or_else(|| MedflowError::unsupported(format!("{output} is not a stream")))?
                    .push(frame)?;
            }
        } else {
            obj.content = DataContent::Static(data);
        }
        obj.version = obj.version.next();
        let version = obj.version;

        self.record_seen(node)?;
        let entry = self.entry_mut(node)?;
        entry.modified = false;
        entry.stats.executions += 1;
        tracing::debug!(%node, kind = entry.kind, %output, version = version.0, fresh, "published");
        Ok(())
    }

    fn record_seen(&mut self, node: NodeId) -> MedflowResult<()> {
        let mut seen = Vec::new();
        for data in self.entry(node)?.inputs.iter().map(|s| s.source) {
            seen.push(match data {
                Some(d) => Some((d, self.data_object(d)?.version)),
                None => None,
            });
        }
        for (slot, s) in self.entry_mut(node)?.inputs.iter_mut().zip(seen) {
            slot.seen = s;
        }
        Ok(())
    }

    /// Next frame of a dynamic object, producing exactly one frame synchronously when none is
    /// buffered.
    pub fn next_frame(&mut self, data: DataId) -> MedflowResult<Arc<Image>> {
        self.begin_pass();
        self.frame_in_pass(data)
    }

    /// Frame of `data` for a reader inside the current pass. The first read takes the next
    /// frame; later reads in the same pass get that same frame.
    pub(crate) fn read_frame(&mut self, data: DataId) -> MedflowResult<Arc<Image>> {
        if let Some(frame) = self.pass.frames.get(&data) {
            return Ok(Arc::clone(frame));
        }
        let frame = self.frame_in_pass(data)?;
        self.pass.frames.insert(data, Arc::clone(&frame));
        Ok(frame)
    }

    fn frame_in_pass(&mut self, data: DataId) -> MedflowResult<Arc<Image>> {
        let producer = self.data_object(data)?.producer;
        let mode = self.resolve_mode(producer)?;
        if !mode.is_dynamic() {
            return Err(MedflowError::unsupported(format!(
                "{data} is not a stream; read it with image()"
            )));
        }
        let fresh = self.needs_fresh_content(producer, mode)?;
        if !fresh {
            if let Some(frame) = self.take_buffered(data)? {
                return Ok(frame);
            }
        }

        self.update_inputs(producer)?;
        let produce = fresh || {
            if mode == OutputMode::FollowInputs && self.inputs_drained(producer)? {
                self.mark_exhausted(data)?;
            }
            !self.stream(data)?.is_exhausted()
        };
        if produce {
            self.execute_node(producer, mode, fresh)?;
        }
        self.take_buffered(data)?.ok_or_else(|| {
            MedflowError::stream_exhausted(format!("{data} has no further frames"))
        })
    }

    fn take_buffered(&mut self, data: DataId) -> MedflowResult<Option<Arc<Image>>> {
        let buf = self
            .object_mut(data)?
            .stream_mut()
            .ok_or_else(|| MedflowError::unsupported(format!("{data} is not a stream")))?;
        if let Some(frame) = buf.take_next() {
            return Ok(Some(frame));
        }
        if buf.is_exhausted() {
            return Err(MedflowError::stream_exhausted(format!(
                "{data} has no further frames"
            )));
        }
        Ok(None)
    }

    pub fn version(&self, data: DataId) -> MedflowResult<Version> {
        Ok(self.data_object(data)?.version())
    }

    pub fn is_valid(&self, data: DataId) -> MedflowResult<bool> {
        Ok(self.data_object(data)?.is_valid())
    }

    /// Static content of `data`.
    pub fn data(&self, data: DataId) -> MedflowResult<&Data> {
        self.data_object(data)?.data()
    }

    /// The static image, or the newest frame of a stream.
    pub fn image(&self, data: DataId) -> MedflowResult<Arc<Image>> {
        let obj = self.data_object(data)?;
        if let Some(img) = obj.latest_image() {
            return Ok(Arc::clone(img));
        }
        match obj.data()? {
            Data::Texture(_) => Err(MedflowError::invalid_input(format!(
                "{data} holds a texture, not an image"
            ))),
            Data::Image(img) => Ok(Arc::clone(img)),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Scene node of a live data object, created as an identity root on first reference.
    pub fn scene_node(&mut self, data: DataId) -> MedflowResult<&SceneNode> {
        self.data_object(data)?;
        Ok(self.scene.get_data_node(data))
    }

    /// Bounding box of `data` in world space: the local box of its image (newest frame for
    /// streams) or texture quad, mapped through the scene-graph world transform.
    pub fn bounding_box(&self, data: DataId) -> MedflowResult<BoundingBox> {
        let obj = self.data_object(data)?;
        let local = match (obj.latest_image(), obj.content()) {
            (Some(img), _) => img.bounding_box(),
            (None, DataContent::Static(Data::Texture(tex))) => BoundingBox::new(
                Vec3::new(tex.quad.x0 as f32, tex.quad.y0 as f32, 0.0),
                Vec3::new(tex.quad.width() as f32, tex.quad.height() as f32, 0.0),
            ),
            _ => {
                return Err(MedflowError::invalid_input(format!(
                    "{data} has no content to bound"
                )));
            }
        };
        Ok(local.transformed(&self.scene.linear_transformation(data)))
    }

    /// Last successfully rendered texture of `renderer`. Never triggers an update.
    pub fn draw(&self, renderer: NodeId) -> Option<DrawCommand> {
        let entry = self.entry(renderer).ok()?;
        let texture = match self.data_object(entry.output).ok()?.content() {
            DataContent::Static(Data::Texture(tex)) => Arc::clone(tex),
            _ => return None,
        };
        let shown = entry.inputs.first().and_then(|s| s.source);
        let transform = match shown {
            Some(d) => self.scene.linear_transformation(d),
            None => self.scene.linear_transformation(entry.output),
        };
        Some(DrawCommand {
            node: renderer,
            texture,
            transform,
        })
    }
}

fn unknown_slot(entry: &NodeEntry, node: NodeId, slot: &str) -> MedflowError {
    MedflowError::invalid_input(format!(
        "{} ({node}) has no input slot '{slot}' (slots: {:?})",
        entry.kind,
        entry.inputs.iter().map(|s| s.name).collect::<Vec<_>>()
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/process/pipeline.rs"]
mod tests;
