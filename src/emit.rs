//! Write-and-sync discipline for event groups.

use crate::error::{Error, Result};
use crate::event::{EVENT_SIZE, InputEventRecord};
use crate::node::DeviceNode;

/// Writes the records of one logical group to a node.
///
/// [`sync`](EventWriter::sync) consumes the writer, so a group ends with
/// exactly one sync marker.
pub struct EventWriter<'a, N: DeviceNode> {
    node: &'a mut N,
}

impl<'a, N: DeviceNode> EventWriter<'a, N> {
    pub fn new(node: &'a mut N) -> Self {
        Self { node }
    }

    /// Writes one record. A short write is an error, never retried.
    pub fn write(&mut self, record: &InputEventRecord) -> Result<()> {
        let bytes = record.to_bytes();
        match self.node.write(&bytes) {
            Ok(written) if written == EVENT_SIZE => Ok(()),
            Ok(written) => Err(Error::ShortWrite {
                what: record.to_string(),
                written,
                expected: EVENT_SIZE,
            }),
            Err(source) => Err(Error::Write {
                record: *record,
                source,
            }),
        }
    }

    pub fn sync(mut self) -> Result<()> {
        self.write(&InputEventRecord::sync())
    }
}

/// Writes `records` followed by a single sync marker.
pub fn emit_group<N: DeviceNode>(node: &mut N, records: &[InputEventRecord]) -> Result<()> {
    let mut writer = EventWriter::new(node);
    for record in records {
        writer.write(record)?;
    }
    writer.sync()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ABS_X, ABS_Y};
    use crate::node::{MemoryNode, NodeCall};

    #[test]
    fn group_ends_with_one_sync() {
        let node = MemoryNode::new();
        let mut owned = node.clone();
        emit_group(
            &mut owned,
            &[
                InputEventRecord::absolute(ABS_X, 1),
                InputEventRecord::absolute(ABS_Y, 2),
            ],
        )
        .unwrap();

        let events = node.events();
        assert_eq!(events.len(), 3);
        assert!(events[2].is_sync());
        assert_eq!(events.iter().filter(|e| e.is_sync()).count(), 1);
    }

    #[test]
    fn empty_group_is_just_a_sync() {
        let node = MemoryNode::new();
        emit_group(&mut node.clone(), &[]).unwrap();
        assert_eq!(node.events(), vec![InputEventRecord::sync()]);
    }

    #[test]
    fn short_write_stops_the_group() {
        let node = MemoryNode::new().short_writes();
        let err = emit_group(&mut node.clone(), &[InputEventRecord::absolute(ABS_X, 1)])
            .unwrap_err();
        assert!(matches!(err, Error::ShortWrite { expected: EVENT_SIZE, .. }));
        assert_eq!(node.calls().len(), 1);
    }

    #[test]
    fn failed_write_names_the_record() {
        let node = MemoryNode::new().fail_when(|call| matches!(call, NodeCall::Write(_)));
        let err = emit_group(&mut node.clone(), &[InputEventRecord::absolute(ABS_Y, 9)])
            .unwrap_err();
        match err {
            Error::Write { record, .. } => assert_eq!(record, InputEventRecord::absolute(ABS_Y, 9)),
            other => panic!("unexpected error {other}"),
        }
    }
}
