//! Fixed-capacity ring buffer of world-space points.

use std::ops::Deref;
use std::sync::Arc;

use glam::Vec3;

/// Circular point store.
///
/// Points live in `[0, len)` in storage order. Once full, new points
/// overwrite the oldest ones starting at the cursor.
#[derive(Debug, Clone)]
pub struct PointCloudBuffer {
    points: Vec<Vec3>,
    capacity: usize,
    cursor: usize,
    count: usize,
}

impl PointCloudBuffer {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::new(),
            capacity: capacity.max(1),
            cursor: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slot the next point will be written to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
        self.count = 0;
    }

    /// Write points at `(cursor + i) mod capacity`, then advance the
    /// cursor and count. Returns the number written.
    pub fn extend<I: IntoIterator<Item = Vec3>>(&mut self, points: I) -> usize {
        let mut written = 0;
        for p in points {
            let slot = (self.cursor + written) % self.capacity;
            if slot == self.points.len() {
                self.points.push(p);
            } else {
                self.points[slot] = p;
            }
            written += 1;
        }
        self.cursor = (self.cursor + written) % self.capacity;
        self.count = (self.count + written).min(self.capacity);
        written
    }

    pub fn push(&mut self, point: Vec3) {
        self.extend(std::iter::once(point));
    }

    /// Live points in storage order. Seed indices refer to this order.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.points[..self.count]
    }

    /// Live points from oldest to newest.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &Vec3> {
        let split = if self.count < self.capacity { 0 } else { self.cursor };
        let (head, tail) = self.as_slice().split_at(split);
        tail.iter().chain(head.iter())
    }

    /// Copy the live points into an immutable snapshot.
    pub fn snapshot(&self) -> PointSnapshot {
        PointSnapshot(Arc::from(self.as_slice()))
    }
}

// ── PointSnapshot ────────────────────────────────────────────────

/// Immutable copy of the live buffer region, cheap to clone and share
/// with a fit running on another task.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSnapshot(Arc<[Vec3]>);

impl PointSnapshot {
    pub fn new(points: Vec<Vec3>) -> Self {
        PointSnapshot(Arc::from(points))
    }
}

impl Deref for PointSnapshot {
    type Target = [Vec3];

    fn deref(&self) -> &[Vec3] {
        &self.0
    }
}
