/// Per-page residency and location metadata.
///
/// A page is in exactly one of three places: resident (`valid`, `frame` is
/// meaningful), swapped out (`on_disk`, `disk_address` is meaningful) or never
/// materialized (neither; its contents come from the program image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub frame: usize,
    pub valid: bool,
    pub dirty: bool,
    pub on_disk: bool,
    pub disk_address: usize,
}

impl PageTableEntry {
    pub const fn new() -> Self {
        Self {
            frame: 0,
            valid: false,
            dirty: false,
            on_disk: false,
            disk_address: 0,
        }
    }

    /// Frame backing this page, if it is resident.
    pub fn resident_frame(&self) -> Option<usize> {
        if self.valid {
            Some(self.frame)
        } else {
            None
        }
    }

    /// Swap slot holding this page, if it was ever written back.
    pub fn swap_slot(&self) -> Option<usize> {
        if self.on_disk {
            Some(self.disk_address)
        } else {
            None
        }
    }
}

impl Default for PageTableEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of pages needed to hold `words` words.
pub const fn pages_for(words: usize, page_size: usize) -> usize {
    (words + page_size - 1) / page_size
}
