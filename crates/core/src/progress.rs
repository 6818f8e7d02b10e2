//! Download progress segmentation
//!
//! The total size is split into a fixed number of display segments of
//! `ceil(total / segments)` bytes each. Bytes are processed in blocks no
//! larger than a segment.

/// Number of display segments in a progress meter
pub const DEFAULT_SEGMENTS: u64 = 50;

/// Upper bound of a processing block in bytes
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    /// `Content-Length`, if the server sent one
    pub total_bytes: Option<u64>,
    pub segments: u64,
    pub segment_size: u64,
    pub block_size: usize,
}

impl SegmentPlan {
    pub fn new(total_bytes: Option<u64>, segments: u64, max_block_size: usize) -> Self {
        let segments = segments.max(1);
        let max_block_size = max_block_size.max(1);
        let segment_size = match total_bytes {
            Some(total) if total > 0 => total.div_ceil(segments),
            _ => max_block_size as u64,
        };
        let block_size = (max_block_size as u64).min(segment_size).max(1) as usize;

        Self {
            total_bytes,
            segments,
            segment_size,
            block_size,
        }
    }

    /// Number of segments completed after `bytes_done` bytes
    pub fn segments_completed(&self, bytes_done: u64) -> u64 {
        match self.total_bytes {
            Some(total) if bytes_done >= total => self.segments,
            Some(_) => (bytes_done / self.segment_size).min(self.segments),
            None => 0,
        }
    }

    /// Split a received chunk into processing blocks
    pub fn blocks<'a>(&self, chunk: &'a [u8]) -> std::slice::Chunks<'a, u8> {
        chunk.chunks(self.block_size)
    }
}

impl Default for SegmentPlan {
    fn default() -> Self {
        Self::new(None, DEFAULT_SEGMENTS, DEFAULT_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_object_uses_full_blocks() {
        let plan = SegmentPlan::new(Some(1_000_000), 50, 4096);
        assert_eq!(plan.segment_size, 20_000);
        assert_eq!(plan.block_size, 4096);
    }

    #[test]
    fn test_segment_size_rounds_up() {
        let plan = SegmentPlan::new(Some(101), 50, 4096);
        assert_eq!(plan.segment_size, 3);
        assert_eq!(plan.block_size, 3);
        assert_eq!(plan.segments_completed(100), 33);
        assert_eq!(plan.segments_completed(101), 50);
    }

    #[test]
    fn test_unknown_length() {
        let plan = SegmentPlan::new(None, 50, 4096);
        assert_eq!(plan.block_size, 4096);
        assert_eq!(plan.segments_completed(1 << 20), 0);
    }

    #[test]
    fn test_blocks_bounded_by_block_size() {
        let plan = SegmentPlan::new(Some(10), 5, 4096);
        let data = [0u8; 10];
        let sizes: Vec<usize> = plan.blocks(&data).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_zero_segments_clamped() {
        let plan = SegmentPlan::new(Some(10), 0, 0);
        assert_eq!(plan.segments, 1);
        assert_eq!(plan.block_size, 1);
    }
}
