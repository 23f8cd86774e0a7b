/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Page ID type. Ids are handed out monotonically starting from 0 and are
/// never reused within a run.
pub type PageId = i64;

/// Sentinel marking "no page".
pub const INVALID_PAGE_ID: PageId = -1;

/// Buffer pool frame ID type, always in `[0, pool_size)`.
pub type FrameId = usize;

/// LSN (Log Sequence Number) type
pub type Lsn = u64;

/// LSN of a page whose contents carry no logged change.
pub const INVALID_LSN: Lsn = 0;

/// How a caller is touching a page. Carried through the fetch/unpin paths
/// so future policies can distinguish scans from point lookups; the LRU-K
/// replacer treats them all the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Lookup,
    Scan,
    Index,
}
