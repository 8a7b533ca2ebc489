//! Diagnostic snapshot of a device

use std::fmt;

use crate::storage::{Geometry, SegmentChain};

/// Point-in-time view of a device, captured under its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub index: usize,
    pub size: u64,
    pub geometry: Geometry,
    pub allocated_bytes: u64,
    pub mappings: usize,
    pub segments: Vec<SegmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentStatus {
    pub index: usize,
    pub geometry: Geometry,
    /// Allocated quanta, or `None` if the segment has no quantum set
    pub quanta: Option<Vec<QuantumStatus>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantumStatus {
    pub slot: usize,
    pub addr: usize,
}

impl DeviceStatus {
    pub(crate) fn capture(index: usize, chain: &SegmentChain, size: u64, mappings: usize) -> Self {
        let segments = chain
            .segments()
            .enumerate()
            .map(|(i, node)| SegmentStatus {
                index: i,
                geometry: node.geometry(),
                quanta: node.quantum_set().map(|set| {
                    set.allocated()
                        .map(|(slot, q)| QuantumStatus { slot, addr: q.addr() })
                        .collect()
                }),
            })
            .collect();

        Self {
            index,
            size,
            geometry: chain.geometry(),
            allocated_bytes: chain.allocated_bytes(),
            mappings,
            segments,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn quantum_count(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|s| s.quanta.as_ref())
            .map(Vec::len)
            .sum()
    }
}

impl fmt::Display for DeviceStatus {
    /// Per-segment summary; slot addresses only for the last segment
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Device {}: qset {}, order {}, sz {}",
            self.index,
            self.geometry.qset(),
            self.geometry.order(),
            self.size
        )?;

        let last = self.segments.len().saturating_sub(1);
        for segment in &self.segments {
            match &segment.quanta {
                None => writeln!(f, "  item {:>4}, no qset", segment.index)?,
                Some(quanta) => {
                    writeln!(
                        f,
                        "  item {:>4}, qset {}/{} quanta",
                        segment.index,
                        quanta.len(),
                        segment.geometry.qset()
                    )?;
                    if segment.index == last {
                        for q in quanta {
                            writeln!(f, "    {:>4}:{:#014x}", q.slot, q.addr)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
