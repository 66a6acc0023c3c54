//! Time-ordered task queue
//!
//! A doubly-linked list whose nodes live in an index arena instead of behind
//! raw pointers. Vacant slots form an intrusive free list so removals never
//! allocate; only growing the arena or an argument buffer can fail.
//!
//! Ordering: ascending `exec_time`, ties in insertion order (a new entry goes
//! after every existing entry with the same time).

use alloc::vec::Vec;

use super::error::SchedulerError;
use super::types::{time_reached, ModuleId, OpCode, ProcessId, TaskEntry};

/// Handle to the most recently inserted entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(usize);

#[derive(Debug)]
struct Node {
    entry: TaskEntry,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
enum Slot {
    Occupied(Node),
    Vacant { next_free: Option<usize> },
}

/// Sorted task list
#[derive(Debug, Default)]
pub struct TaskQueue {
    slots: Vec<Slot>,
    free_head: Option<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    last_inserted: Option<usize>,
}

impl TaskQueue {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            head: None,
            tail: None,
            len: 0,
            last_inserted: None,
        }
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Insert an entry in time order and remember it for [`append_args`](Self::append_args).
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::OutOfMemory` if the arena cannot grow.
    pub fn insert_sorted(&mut self, entry: TaskEntry) -> Result<TaskHandle, SchedulerError> {
        let index = self.link_sorted(entry)?;
        self.last_inserted = Some(index);
        Ok(TaskHandle(index))
    }

    /// Put a periodic entry back without touching the "last inserted" handle.
    pub(crate) fn requeue(&mut self, entry: TaskEntry) -> Result<(), SchedulerError> {
        self.link_sorted(entry).map(|_| ())
    }

    /// Append payload bytes to the most recently inserted entry.
    ///
    /// Returns `Ok(false)` when no entry is pending attachment (nothing was
    /// inserted yet, or a pop/removal has cleared the handle since).
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::OutOfMemory` if the argument buffer cannot grow;
    /// the entry keeps its previous arguments.
    pub fn append_args(&mut self, bytes: &[u8]) -> Result<bool, SchedulerError> {
        let Some(index) = self.last_inserted else {
            return Ok(false);
        };
        let Some(Slot::Occupied(node)) = self.slots.get_mut(index) else {
            self.last_inserted = None;
            return Ok(false);
        };
        node.entry
            .args
            .try_reserve(bytes.len())
            .map_err(|_| SchedulerError::OutOfMemory)?;
        node.entry.args.extend_from_slice(bytes);
        Ok(true)
    }

    /// Entry referenced by a handle, if it is still queued
    pub fn get(&self, handle: TaskHandle) -> Option<&TaskEntry> {
        match self.slots.get(handle.0) {
            Some(Slot::Occupied(node)) => Some(&node.entry),
            _ => None,
        }
    }

    /// Earliest entry, without removing it
    pub fn peek_earliest(&self) -> Option<&TaskEntry> {
        self.head.map(|index| &self.node(index).entry)
    }

    /// Remove and return the earliest entry.
    ///
    /// Always clears the "last inserted" handle.
    pub fn pop_earliest(&mut self) -> Option<TaskEntry> {
        self.last_inserted = None;
        let head = self.head?;
        Some(self.unlink(head))
    }

    /// Remove the first entry matching module, op code and argument bytes.
    pub fn remove_matching(&mut self, module_id: ModuleId, op_code: OpCode, args: &[u8]) -> bool {
        match self.find(|entry| entry.matches(module_id, op_code, args)) {
            Some(index) => {
                self.unlink(index);
                true
            }
            None => false,
        }
    }

    /// Remove the first entry with the given process id.
    pub fn remove_by_process_id(&mut self, process_id: ProcessId) -> bool {
        match self.find(|entry| entry.process_id == process_id) {
            Some(index) => {
                self.unlink(index);
                true
            }
            None => false,
        }
    }

    /// Whether an entry with the given process id is queued
    pub fn contains(&self, process_id: ProcessId) -> bool {
        self.iter().any(|entry| entry.process_id == process_id)
    }

    /// Iterate entries in execution order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cursor: self.head,
        }
    }

    /// Free every entry.
    ///
    /// Returns the number of entries dropped. Calling it on an empty queue is
    /// a no-op returning `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::QueueCorrupted` when the number of nodes
    /// reachable from the head disagrees with the size counter. The queue is
    /// emptied either way.
    pub fn drop_all(&mut self) -> Result<usize, SchedulerError> {
        let expected = self.len;
        let found = self.iter().count();

        self.slots.clear();
        self.free_head = None;
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.last_inserted = None;

        if found == expected {
            Ok(found)
        } else {
            Err(SchedulerError::QueueCorrupted { expected, found })
        }
    }

    fn node(&self, index: usize) -> &Node {
        match &self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked index {} points at a vacant slot", index),
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node {
        match &mut self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked index {} points at a vacant slot", index),
        }
    }

    fn find<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&TaskEntry) -> bool,
    {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.node(index);
            if predicate(&node.entry) {
                return Some(index);
            }
            cursor = node.next;
        }
        None
    }

    /// Claim a slot for `node`, reusing a vacant one when possible.
    fn allocate(&mut self, node: Node) -> Result<usize, SchedulerError> {
        if let Some(index) = self.free_head {
            if let Slot::Vacant { next_free } = self.slots[index] {
                self.free_head = next_free;
            }
            self.slots[index] = Slot::Occupied(node);
            return Ok(index);
        }

        self.slots
            .try_reserve(1)
            .map_err(|_| SchedulerError::OutOfMemory)?;
        self.slots.push(Slot::Occupied(node));
        Ok(self.slots.len() - 1)
    }

    fn link_sorted(&mut self, entry: TaskEntry) -> Result<usize, SchedulerError> {
        let exec_time = entry.exec_time;

        // First node strictly later than the new entry; None means append.
        let successor = match self.tail {
            Some(tail) if time_reached(self.node(tail).entry.exec_time, exec_time) => None,
            _ => self.find(|queued| !time_reached(queued.exec_time, exec_time)),
        };
        let predecessor = match successor {
            Some(next) => self.node(next).prev,
            None => self.tail,
        };

        let index = self.allocate(Node {
            entry,
            prev: predecessor,
            next: successor,
        })?;

        match predecessor {
            Some(prev) => self.node_mut(prev).next = Some(index),
            None => self.head = Some(index),
        }
        match successor {
            Some(next) => self.node_mut(next).prev = Some(index),
            None => self.tail = Some(index),
        }

        self.len += 1;
        Ok(index)
    }

    fn unlink(&mut self, index: usize) -> TaskEntry {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let Slot::Occupied(node) = core::mem::replace(&mut self.slots[index], vacant) else {
            unreachable!("unlinking vacant slot {}", index);
        };
        self.free_head = Some(index);

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        if self.last_inserted == Some(index) {
            self.last_inserted = None;
        }
        self.len -= 1;
        node.entry
    }
}

/// Iterator over queued entries in execution order
pub struct Iter<'q> {
    queue: &'q TaskQueue,
    cursor: Option<usize>,
}

impl<'q> Iterator for Iter<'q> {
    type Item = &'q TaskEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.queue.node(index);
        self.cursor = node.next;
        Some(&node.entry)
    }
}
