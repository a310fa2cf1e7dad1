use types::{Interrupt, PageTableEntry};

/// Why a logical address could not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Negative address, page past the end of the table, or a physical
    /// address outside memory.
    InvalidAddress,
    /// The page exists but is not resident.
    PageFault { page: usize },
}

impl From<Fault> for Interrupt {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::InvalidAddress => Interrupt::InvalidAddress,
            Fault::PageFault { page } => Interrupt::PageFault { page },
        }
    }
}

/// Result of a successful translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub physical: usize,
    pub page: usize,
}

/// Splits a logical address into (page, offset), rejecting negative
/// addresses and pages the table does not cover.
pub fn split(logical: i32, table_len: usize, page_size: usize) -> Result<(usize, usize), Fault> {
    if logical < 0 {
        return Err(Fault::InvalidAddress);
    }
    let logical = logical as usize;
    let page = logical / page_size;
    let offset = logical % page_size;
    if page >= table_len {
        return Err(Fault::InvalidAddress);
    }
    Ok((page, offset))
}

/// Translates a logical address through `table`.
///
/// Pure: nothing is recorded on failure, the caller raises the interrupt.
pub fn translate(
    logical: i32,
    table: &[PageTableEntry],
    page_size: usize,
    memory_size: usize,
) -> Result<Translation, Fault> {
    let (page, offset) = split(logical, table.len(), page_size)?;
    let entry = &table[page];
    if !entry.valid {
        return Err(Fault::PageFault { page });
    }
    let physical = entry.frame * page_size + offset;
    if physical >= memory_size {
        return Err(Fault::InvalidAddress);
    }
    Ok(Translation { physical, page })
}

/// Residency check used by the syscall path: Ok(page) if the page holding
/// `logical` is resident, a fault otherwise. Never touches memory.
pub fn resident_page(logical: i32, table: &[PageTableEntry], page_size: usize) -> Result<usize, Fault> {
    let (page, _) = split(logical, table.len(), page_size)?;
    if table[page].valid {
        Ok(page)
    } else {
        Err(Fault::PageFault { page })
    }
}
