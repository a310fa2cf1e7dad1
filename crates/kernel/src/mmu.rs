//! Frame table and swap slot bookkeeping.

use types::Pid;

/// One physical frame.
///
/// `owner` is the (pid, page) the frame holds or is being loaded for.
/// `waiter` reserves the frame for a (pid, page) blocked until a write-back
/// out of it finishes. `busy` is set while a disk or console transfer
/// targets the frame; a busy frame is never handed out or evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub owner: Option<(Pid, usize)>,
    pub waiter: Option<(Pid, usize)>,
    pub busy: bool,
}

impl Frame {
    pub fn is_free(&self) -> bool {
        self.owner.is_none() && self.waiter.is_none() && !self.busy
    }
}

#[derive(Debug, Clone)]
pub struct FrameTable {
    frames: Vec<Frame>,
}

impl FrameTable {
    pub fn new(count: usize) -> Self {
        Self {
            frames: vec![Frame::default(); count],
        }
    }

    pub fn get(&self, frame: usize) -> Option<&Frame> {
        self.frames.get(frame)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Lowest-numbered free frame.
    pub fn find_free_frame(&self) -> Option<usize> {
        self.frames.iter().position(Frame::is_free)
    }

    /// Lowest-numbered occupied frame that nobody waits on and no transfer
    /// targets.
    pub fn select_victim_frame(&self) -> Option<usize> {
        self.frames
            .iter()
            .position(|f| f.owner.is_some() && f.waiter.is_none() && !f.busy)
    }

    pub fn occupy(&mut self, frame: usize, pid: Pid, page: usize) {
        if let Some(f) = self.frames.get_mut(frame) {
            f.owner = Some((pid, page));
        }
    }

    /// Drops ownership and any waiter. A transfer in flight keeps the frame
    /// reserved until its completion clears `busy`.
    pub fn free(&mut self, frame: usize) {
        if let Some(f) = self.frames.get_mut(frame) {
            f.owner = None;
            f.waiter = None;
        }
    }

    /// Reserves `frame` for (pid, page). Fails if someone already waits on it.
    pub fn set_waiter(&mut self, frame: usize, pid: Pid, page: usize) -> bool {
        match self.frames.get_mut(frame) {
            Some(f) if f.waiter.is_none() => {
                f.waiter = Some((pid, page));
                true
            }
            _ => false,
        }
    }

    pub fn take_waiter(&mut self, frame: usize) -> Option<(Pid, usize)> {
        self.frames.get_mut(frame).and_then(|f| f.waiter.take())
    }

    pub fn set_busy(&mut self, frame: usize, busy: bool) {
        if let Some(f) = self.frames.get_mut(frame) {
            f.busy = busy;
        }
    }

    /// Releases every frame `pid` owns and every reservation it holds.
    /// Returns the frames whose ownership was dropped.
    pub fn release_process(&mut self, pid: Pid) -> Vec<usize> {
        let mut released = Vec::new();
        for (index, f) in self.frames.iter_mut().enumerate() {
            if matches!(f.owner, Some((owner, _)) if owner == pid) {
                f.owner = None;
                released.push(index);
            }
            if matches!(f.waiter, Some((waiter, _)) if waiter == pid) {
                f.waiter = None;
            }
        }
        released
    }

    pub fn occupied_count(&self) -> usize {
        self.frames.iter().filter(|f| f.owner.is_some()).count()
    }
}

/// Allocator of swap addresses. Released slots are reused lowest first.
#[derive(Debug, Clone, Default)]
pub struct SwapSlots {
    free: Vec<usize>,
    next: usize,
}

impl SwapSlots {
    pub fn allocate(&mut self) -> usize {
        if let Some(slot) = self.free.pop() {
            return slot;
        }
        let slot = self.next;
        self.next += 1;
        slot
    }

    pub fn release(&mut self, slot: usize) {
        if slot < self.next && !self.free.contains(&slot) {
            self.free.push(slot);
            self.free.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    pub fn in_use(&self) -> usize {
        self.next - self.free.len()
    }
}
