//! Split a selection into a parallel prefix and a serial suffix

use crate::core::types::Command;

/// The two disjoint, order-preserving halves of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batches<'a> {
    pub parallel: &'a [Command],
    pub serial: &'a [Command],
}

impl<'a> Batches<'a> {
    pub fn len(&self) -> usize {
        self.parallel.len() + self.serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both halves have work, i.e. the run has two phases
    pub fn is_mixed(&self) -> bool {
        !self.parallel.is_empty() && !self.serial.is_empty()
    }
}

/// Number of commands that go to the parallel batch
///
/// `serial_from` is the 1-based position within the selection where serial
/// execution starts. Positions past the end mean "nothing serial".
pub fn split_point(len: usize, serial_from: Option<usize>) -> usize {
    match serial_from {
        Some(position) if position <= len => position.saturating_sub(1),
        _ => len,
    }
}

/// Partition `selection` around `serial_from`
pub fn partition(selection: &[Command], serial_from: Option<usize>) -> Batches<'_> {
    let (parallel, serial) = selection.split_at(split_point(selection.len(), serial_from));
    Batches { parallel, serial }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn commands(count: usize) -> Vec<Command> {
        (0..count)
            .map(|i| Command::new(i, format!("echo {}", i)))
            .collect()
    }

    #[test]
    fn test_absent_serial_from_is_all_parallel() {
        let cmds = commands(5);
        let batches = partition(&cmds, None);
        assert_eq!(batches.parallel.len(), 5);
        assert!(batches.serial.is_empty());
        assert!(!batches.is_mixed());
    }

    #[test]
    fn test_serial_from_one_is_all_serial() {
        let cmds = commands(5);
        let batches = partition(&cmds, Some(1));
        assert!(batches.parallel.is_empty());
        assert_eq!(batches.serial.len(), 5);
    }

    #[test]
    fn test_serial_from_past_end_is_all_parallel() {
        let cmds = commands(3);
        let batches = partition(&cmds, Some(4));
        assert_eq!(batches.parallel.len(), 3);
        assert!(batches.serial.is_empty());
    }

    #[test]
    fn test_mixed_split_keeps_indices() {
        let cmds: Vec<Command> = (9..14)
            .map(|i| Command::new(i, format!("job {}", i)))
            .collect();
        let batches = partition(&cmds, Some(3));

        let parallel: Vec<usize> = batches.parallel.iter().map(|c| c.index).collect();
        let serial: Vec<usize> = batches.serial.iter().map(|c| c.index).collect();
        assert_eq!(parallel, vec![9, 10]);
        assert_eq!(serial, vec![11, 12, 13]);
        assert!(batches.is_mixed());
    }

    proptest! {
        #[test]
        fn prop_partition_sizes(len in 0usize..100, position in 0usize..120) {
            let cmds = commands(len);
            let batches = partition(&cmds, Some(position));

            prop_assert_eq!(batches.len(), len);
            if position <= 1 {
                prop_assert!(batches.parallel.is_empty());
            } else if position > len {
                prop_assert!(batches.serial.is_empty());
            } else {
                prop_assert_eq!(batches.parallel.len(), position - 1);
            }
        }
    }
}
