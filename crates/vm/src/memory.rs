use types::Word;

/// Physical memory: a flat array of tagged words, split into frames of
/// `page_size` words by whoever manages it.
#[derive(Debug, Clone)]
pub struct Memory {
    words: Vec<Word>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![Word::EMPTY; size],
        }
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn read(&self, addr: usize) -> Option<Word> {
        self.words.get(addr).copied()
    }

    /// Writes a cell. Returns false if `addr` is outside memory.
    pub fn write(&mut self, addr: usize, word: Word) -> bool {
        match self.words.get_mut(addr) {
            Some(cell) => {
                *cell = word;
                true
            }
            None => false,
        }
    }

    /// Words of one frame. Empty if the frame lies outside memory.
    pub fn frame(&self, frame: usize, page_size: usize) -> &[Word] {
        let start = frame * page_size;
        let end = start + page_size;
        self.words.get(start..end).unwrap_or(&[])
    }

    /// Copies `words` into a frame, filling the remainder with empty cells.
    pub fn load_frame(&mut self, frame: usize, page_size: usize, words: &[Word]) {
        let start = frame * page_size;
        let end = (start + page_size).min(self.words.len());
        if start >= end {
            return;
        }
        for (offset, cell) in self.words[start..end].iter_mut().enumerate() {
            *cell = words.get(offset).copied().unwrap_or(Word::EMPTY);
        }
    }

    /// Renders `[start, end)` one cell per line, as the console prints it.
    pub fn dump(&self, start: usize, end: usize) -> String {
        let end = end.min(self.words.len());
        let mut out = String::new();
        for addr in start..end {
            out.push_str(&format!("{:>4}:  {}\n", addr, self.words[addr]));
        }
        out
    }
}
