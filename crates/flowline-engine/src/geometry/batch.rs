use std::collections::HashMap;
use std::sync::Arc;

use super::BatchError;

/// Identifier of a source feature.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u64);

/// All line runs recorded for one feature.
#[derive(Debug)]
pub struct LineBatchEntry<F> {
    /// Back-reference to the feature the runs were read from.
    pub feature: Arc<F>,
    /// One flat coordinate run per line string, in insertion order.
    pub runs: Vec<Vec<f64>>,
    /// Vertices over all runs of this entry.
    pub vertex_count: usize,
}

/// Line geometry accumulated per feature, ready for instruction encoding.
///
/// Every run shares the batch stride: `x, y` followed by `stride - 2` pass-through
/// scalars (e.g. a time offset). Counters are kept so the encoder can size its
/// output up front.
///
/// Performance characteristics:
/// - `add_line()` is O(run length) (one copy of the coordinates)
/// - `clear()` keeps the entry list allocation for reuse
#[derive(Debug)]
pub struct LineBatch<F> {
    stride: usize,
    entries: Vec<LineBatchEntry<F>>,
    index: HashMap<FeatureId, usize>,
    total_vertices: usize,
    total_lines: usize,
}

impl<F> LineBatch<F> {
    pub fn new(stride: usize) -> Result<Self, BatchError> {
        if stride < 2 {
            return Err(BatchError::InvalidStride(stride));
        }
        Ok(Self {
            stride,
            entries: Vec::new(),
            index: HashMap::new(),
            total_vertices: 0,
            total_lines: 0,
        })
    }

    /// Appends a line run to the feature's entry, creating the entry on first use.
    pub fn add_line(
        &mut self,
        id: FeatureId,
        feature: &Arc<F>,
        flat_coords: &[f64],
        stride: usize,
    ) -> Result<(), BatchError> {
        if stride != self.stride {
            return Err(BatchError::StrideMismatch { expected: self.stride, got: stride });
        }
        if flat_coords.len() % stride != 0 {
            return Err(BatchError::RaggedCoordinates { len: flat_coords.len(), stride });
        }

        let vertex_count = flat_coords.len() / stride;
        let slot = match self.index.get(&id) {
            Some(&slot) => slot,
            None => {
                self.entries.push(LineBatchEntry {
                    feature: Arc::clone(feature),
                    runs: Vec::new(),
                    vertex_count: 0,
                });
                self.index.insert(id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[slot];
        entry.runs.push(flat_coords.to_vec());
        entry.vertex_count += vertex_count;

        self.total_vertices += vertex_count;
        self.total_lines += 1;
        Ok(())
    }

    /// Drops all entries and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.total_vertices = 0;
        self.total_lines = 0;
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Entries in first-seen order.
    #[inline]
    pub fn entries(&self) -> &[LineBatchEntry<F>] {
        &self.entries
    }

    #[inline]
    pub fn total_vertices(&self) -> usize {
        self.total_vertices
    }

    /// Number of distinct features holding at least one run.
    #[inline]
    pub fn total_features(&self) -> usize {
        self.entries.len()
    }

    /// Number of line runs; each one gets its own header in the instruction buffer.
    #[inline]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_lines == 0
    }
}
