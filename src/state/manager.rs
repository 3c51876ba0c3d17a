use std::collections::HashMap;

use crate::feature::model::Feature;
use crate::foundation::core::FeatureId;

/// Floats per vertex in the interaction buffer: `isPlaying`, `localTime`, `phaseOffset`.
pub const INTERACTION_STRIDE: usize = 3;

/// `(is_playing, local_time, phase_offset)` written for a feature position with no state entry.
pub const UNTRACKED_VALUES: (bool, f64, f64) = (false, 0.0, 0.0);

/// Play state of one feature id.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FeatureAnimationState {
    pub feature_id: FeatureId,
    pub is_playing: bool,
    /// Effective time captured at the last pause. Not touched while playing.
    pub local_time: f64,
    pub play_count: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    state: FeatureAnimationState,
    /// Offset assigned by the timing calculator.
    base_offset: f64,
    /// Offset added to the global clock while playing. Equals `base_offset` until a resume
    /// re-anchors it to the frozen local time.
    phase_offset: f64,
    anchored: bool,
}

impl Entry {
    fn new(feature_id: FeatureId, is_playing: bool) -> Self {
        Self {
            state: FeatureAnimationState {
                feature_id,
                is_playing,
                local_time: 0.0,
                play_count: 0,
            },
            base_offset: 0.0,
            phase_offset: 0.0,
            anchored: false,
        }
    }

    fn effective_time(&self, global_time: f64) -> f64 {
        if self.state.is_playing {
            global_time + self.phase_offset
        } else {
            self.state.local_time
        }
    }
}

/// Per-vertex expansion of the play state, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionBufferData {
    /// `INTERACTION_STRIDE` floats per vertex.
    pub values: Vec<f32>,
    pub vertex_count: usize,
}

impl InteractionBufferData {
    /// Append records for vertices that belong to no feature. They always follow the clock.
    pub fn push_unbound(&mut self, count: u32) {
        for _ in 0..count {
            self.values.extend_from_slice(&[1.0, 0.0, 0.0]);
        }
        self.vertex_count += count as usize;
    }
}

/// Owns per-feature play/pause state and the shared animation clock.
///
/// Mutators ignore unknown ids and report whether anything changed. Any change sets the dirty
/// flag, which the consumer clears after re-uploading the interaction buffer.
#[derive(Debug, Clone)]
pub struct FeatureAnimationStateManager {
    initial_playing: bool,
    entries: Vec<Entry>,
    index_by_id: HashMap<FeatureId, usize>,
    /// Entry index for each feature position of the last initialized batch.
    feature_slots: Vec<usize>,
    global_time: f64,
    delta_time: f64,
    dirty: bool,
}

impl FeatureAnimationStateManager {
    pub fn new(initial_playing: bool) -> Self {
        Self {
            initial_playing,
            entries: Vec::new(),
            index_by_id: HashMap::new(),
            feature_slots: Vec::new(),
            global_time: 0.0,
            delta_time: 0.0,
            dirty: false,
        }
    }

    /// Rebuild the state table for a new feature batch.
    ///
    /// Surviving ids keep their state, vanished ids are dropped, new ids start in the configured
    /// initial state. Features sharing an id share one state.
    pub fn initialize_from_features(&mut self, features: &[Feature], id_property: Option<&str>) {
        let mut previous: HashMap<FeatureId, Entry> = self
            .entries
            .drain(..)
            .map(|e| (e.state.feature_id.clone(), e))
            .collect();
        self.index_by_id.clear();
        self.feature_slots.clear();
        self.feature_slots.reserve(features.len());

        for (i, feature) in features.iter().enumerate() {
            let id = feature.resolve_id(i, id_property);
            let slot = match self.index_by_id.get(&id) {
                Some(&slot) => slot,
                None => {
                    let entry = previous
                        .remove(&id)
                        .unwrap_or_else(|| Entry::new(id.clone(), self.initial_playing));
                    let slot = self.entries.len();
                    self.entries.push(entry);
                    self.index_by_id.insert(id, slot);
                    slot
                }
            };
            self.feature_slots.push(slot);
        }

        if !previous.is_empty() {
            tracing::debug!(dropped = previous.len(), "dropped states for vanished feature ids");
        }
        self.dirty = true;
    }

    /// Assign timing offsets by feature position. Entries re-anchored by a resume keep their
    /// phase; the first feature of a shared id decides that id's offset.
    pub fn set_time_offsets(&mut self, offsets: &[f64]) {
        let mut seen = vec![false; self.entries.len()];
        for (&slot, &offset) in self.feature_slots.iter().zip(offsets) {
            if std::mem::replace(&mut seen[slot], true) {
                continue;
            }
            let entry = &mut self.entries[slot];
            entry.base_offset = offset;
            if !entry.anchored {
                entry.phase_offset = offset;
            }
        }
        self.dirty = true;
    }

    /// Advance the shared clock. Per-feature state is derived from it on read.
    pub fn tick(&mut self, global_time: f64, delta_time: f64) {
        self.global_time = global_time;
        self.delta_time = delta_time;
    }

    pub fn global_time(&self) -> f64 {
        self.global_time
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    fn entry_mut(&mut self, id: &FeatureId) -> Option<&mut Entry> {
        let slot = *self.index_by_id.get(id)?;
        self.entries.get_mut(slot)
    }

    /// Paused → Playing, continuing from the frozen local time.
    pub fn play(&mut self, id: &FeatureId) -> bool {
        let global = self.global_time;
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.state.is_playing {
            return false;
        }
        entry.phase_offset = entry.state.local_time - global;
        entry.anchored = true;
        entry.state.is_playing = true;
        entry.state.play_count = entry.state.play_count.saturating_add(1);
        self.dirty = true;
        true
    }

    /// Playing → Paused, freezing the current effective time.
    pub fn pause(&mut self, id: &FeatureId) -> bool {
        let global = self.global_time;
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if !entry.state.is_playing {
            return false;
        }
        entry.state.local_time = entry.effective_time(global).max(0.0);
        entry.state.is_playing = false;
        self.dirty = true;
        true
    }

    pub fn toggle(&mut self, id: &FeatureId) -> bool {
        match self.is_playing(id) {
            Some(true) => self.pause(id),
            Some(false) => self.play(id),
            None => false,
        }
    }

    /// Same as [`play`](Self::play). Stopping after one loop is the caller's job.
    pub fn play_once(&mut self, id: &FeatureId) -> bool {
        self.play(id)
    }

    /// Zero the local time and play count without changing the play state.
    pub fn reset(&mut self, id: &FeatureId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.state.local_time = 0.0;
        entry.state.play_count = 0;
        entry.phase_offset = entry.base_offset;
        entry.anchored = false;
        self.dirty = true;
        true
    }

    pub fn play_all(&mut self) -> usize {
        self.apply_all(Self::play)
    }

    pub fn pause_all(&mut self) -> usize {
        self.apply_all(Self::pause)
    }

    pub fn reset_all(&mut self) -> usize {
        self.apply_all(Self::reset)
    }

    fn apply_all(&mut self, op: fn(&mut Self, &FeatureId) -> bool) -> usize {
        let ids: Vec<FeatureId> = self
            .entries
            .iter()
            .map(|e| e.state.feature_id.clone())
            .collect();
        ids.iter().filter(|id| op(self, id)).count()
    }

    pub fn state(&self, id: &FeatureId) -> Option<&FeatureAnimationState> {
        let slot = *self.index_by_id.get(id)?;
        self.entries.get(slot).map(|e| &e.state)
    }

    pub fn is_playing(&self, id: &FeatureId) -> Option<bool> {
        self.state(id).map(|s| s.is_playing)
    }

    /// `global + phase offset` while playing, the frozen local time while paused.
    pub fn effective_time(&self, id: &FeatureId) -> Option<f64> {
        let slot = *self.index_by_id.get(id)?;
        self.entries
            .get(slot)
            .map(|e| e.effective_time(self.global_time))
    }

    /// `(is_playing, local_time, phase_offset)` for a feature position of the last batch.
    pub fn feature_values(&self, feature_index: usize) -> Option<(bool, f64, f64)> {
        let slot = *self.feature_slots.get(feature_index)?;
        let e = &self.entries[slot];
        Some((e.state.is_playing, e.state.local_time, e.phase_offset))
    }

    /// Expand per-feature state to one record per vertex.
    ///
    /// `vertices_per_feature[i]` is the vertex count emitted for feature position `i`; positions
    /// beyond the last initialized batch are written as paused at time zero.
    pub fn generate_buffer_data(&self, vertices_per_feature: &[u32]) -> InteractionBufferData {
        let vertex_count: usize = vertices_per_feature.iter().map(|&n| n as usize).sum();
        let mut values = Vec::with_capacity(vertex_count * INTERACTION_STRIDE);
        for (i, &n) in vertices_per_feature.iter().enumerate() {
            let (playing, local, phase) = self.feature_values(i).unwrap_or(UNTRACKED_VALUES);
            let record = [f32::from(u8::from(playing)), local as f32, phase as f32];
            for _ in 0..n {
                values.extend_from_slice(&record);
            }
        }
        InteractionBufferData {
            values,
            vertex_count,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &FeatureAnimationState> {
        self.entries.iter().map(|e| &e.state)
    }
}

impl Default for FeatureAnimationStateManager {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/manager.rs"]
mod tests;
