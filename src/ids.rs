//! Identity allocation for session entities.

/// Allocates unique ids for reference images and directives.
///
/// Keeping allocation behind a trait makes collisions impossible by
/// construction and lets tests inject a deterministic allocator.
pub trait IdAllocator: Send {
    /// Returns the next unique id.
    fn next_id(&mut self) -> String;
}

/// Allocator backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Monotonic allocator producing `prefix-0`, `prefix-1`, ... in order.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    prefix: String,
    next: u64,
}

impl SequenceAllocator {
    /// Creates an allocator with the given id prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdAllocator for SequenceAllocator {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
