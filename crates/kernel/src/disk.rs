use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use types::{Interrupt, Pid, Word};

use crate::queue::lock;

/// Where a page-in reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// The process image; the page has never been written back.
    Image(Arc<[Word]>),
    /// A swap slot.
    Swap(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskRequest {
    /// Read `page` of `pid` into `frame`.
    PageIn {
        pid: Pid,
        page: usize,
        frame: usize,
        source: PageSource,
    },
    /// Write the contents `frame` held for (`pid`, `page`) to `disk_address`.
    PageOut {
        pid: Pid,
        page: usize,
        frame: usize,
        disk_address: usize,
        words: Vec<Word>,
    },
}

/// Backing store for swapped pages.
///
/// Performs transfers without touching kernel state: the result of each
/// request is returned as a completion interrupt for the handler.
#[derive(Debug)]
pub struct DiskManager {
    swap: Mutex<HashMap<usize, Vec<Word>>>,
    page_size: usize,
    latency: Duration,
}

impl DiskManager {
    pub fn new(page_size: usize, latency: Duration) -> Self {
        Self {
            swap: Mutex::new(HashMap::new()),
            page_size,
            latency,
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn perform(&self, request: DiskRequest) -> Interrupt {
        match request {
            DiskRequest::PageIn {
                pid,
                page,
                frame,
                source,
            } => {
                let mut words = match source {
                    PageSource::Image(image) => {
                        let start = (page * self.page_size).min(image.len());
                        let end = (start + self.page_size).min(image.len());
                        image[start..end].to_vec()
                    }
                    PageSource::Swap(slot) => lock(&self.swap).get(&slot).cloned().unwrap_or_default(),
                };
                words.resize(self.page_size, Word::EMPTY);
                Interrupt::PageInComplete {
                    pid,
                    page,
                    frame,
                    words,
                }
            }
            DiskRequest::PageOut {
                frame,
                disk_address,
                words,
                ..
            } => {
                lock(&self.swap).insert(disk_address, words);
                Interrupt::PageOutComplete { frame }
            }
        }
    }
}
