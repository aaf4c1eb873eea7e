use std::ops::Range;

/// Offset table mapping each child of a composite (or each layer of a
/// network) to its `(offset, len)` slice of one flat parameter vector.
///
/// Built once from the children's parameter counts; lookups never rescan the
/// children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamIndex {
    offsets: Vec<usize>,
    total: usize,
}

impl ParamIndex {
    pub fn from_counts<I>(counts: I) -> ParamIndex
    where
        I: IntoIterator<Item = usize>,
    {
        let mut offsets = Vec::new();
        let mut total = 0;
        for count in counts {
            offsets.push(total);
            total += count;
        }
        ParamIndex { offsets, total }
    }

    /// Total number of parameters across all slots.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn slots(&self) -> usize {
        self.offsets.len()
    }

    pub fn range(&self, slot: usize) -> Range<usize> {
        let start = self.offsets[slot];
        let end = self.offsets.get(slot + 1).copied().unwrap_or(self.total);
        start..end
    }

    /// Resolves a flat index to `(slot, local index)`. Empty slots are never
    /// returned.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.total {
            return None;
        }
        // Last slot whose offset is <= index; skips over zero-length slots
        // sharing the same offset.
        let slot = self.offsets.partition_point(|&o| o <= index) - 1;
        Some((slot, index - self.offsets[slot]))
    }
}
