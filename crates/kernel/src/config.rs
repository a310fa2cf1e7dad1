use std::time::Duration;

/// Machine and scheduler parameters.
///
/// Built from `Default` and the `with_*` setters, which keep every size
/// and count at least 1.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Physical memory, in words.
    pub(crate) memory_size: usize,
    /// Words per page and per frame.
    pub(crate) page_size: usize,
    /// Instructions a process runs before it is preempted.
    pub(crate) quantum: usize,
    /// Simulated latency of one disk transfer (continuous mode).
    pub(crate) disk_latency: Duration,
    /// Simulated latency of one console transfer (continuous mode).
    pub(crate) device_latency: Duration,
    /// Number of console worker threads in continuous mode.
    pub(crate) device_workers: usize,
    /// In blocking mode, one pending request is completed every this many
    /// CPU steps while a process is running.
    pub(crate) blocking_io_interval: usize,
    /// Trace every instruction and every scheduler transition to stdout.
    pub(crate) trace: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            memory_size: 1024,
            page_size: 16,
            quantum: 4,
            disk_latency: Duration::from_millis(50),
            device_latency: Duration::from_millis(50),
            device_workers: 1,
            blocking_io_interval: 8,
            trace: false,
        }
    }
}

impl KernelConfig {
    pub fn with_memory_size(mut self, words: usize) -> Self {
        self.memory_size = words;
        self
    }

    pub fn with_page_size(mut self, words: usize) -> Self {
        self.page_size = words.max(1);
        self
    }

    pub fn with_quantum(mut self, quantum: usize) -> Self {
        self.quantum = quantum.max(1);
        self
    }

    pub fn with_disk_latency(mut self, latency: Duration) -> Self {
        self.disk_latency = latency;
        self
    }

    pub fn with_device_latency(mut self, latency: Duration) -> Self {
        self.device_latency = latency;
        self
    }

    pub fn with_device_workers(mut self, workers: usize) -> Self {
        self.device_workers = workers.max(1);
        self
    }

    pub fn with_blocking_io_interval(mut self, steps: usize) -> Self {
        self.blocking_io_interval = steps.max(1);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn quantum(&self) -> usize {
        self.quantum
    }

    /// Number of physical frames. Trailing words that do not fill a frame are unused.
    pub fn frame_count(&self) -> usize {
        self.memory_size / self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_zero() {
        let config = KernelConfig::default()
            .with_memory_size(0)
            .with_page_size(0)
            .with_quantum(0)
            .with_device_workers(0)
            .with_blocking_io_interval(0);
        assert_eq!(config.page_size(), 1);
        assert_eq!(config.quantum(), 1);
        assert_eq!(config.device_workers, 1);
        assert_eq!(config.blocking_io_interval, 1);
        assert_eq!(config.frame_count(), 0);
    }

    #[test]
    fn trailing_words_do_not_form_a_frame() {
        let config = KernelConfig::default().with_memory_size(70).with_page_size(16);
        assert_eq!(config.frame_count(), 4);
    }
}
