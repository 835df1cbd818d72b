use std::fmt;

/// Outcome of a single page download
///
/// Every page visited by a chapter download ends in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    /// Image fetched and written to disk
    Saved,

    /// Output file already existed, nothing fetched
    Skipped,

    /// Page number outside `[1, page_count]` or chapter not in the index
    Unavailable,

    /// Page view had no image element, even after re-fetching
    MissingImage,

    /// Page view or image could not be fetched
    FetchFailed,

    /// Image fetched but the file could not be written
    WriteFailed,
}

impl PageOutcome {
    /// Returns true if the image is on disk after this outcome
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Saved | Self::Skipped)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        !self.is_complete()
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Saved => "saved",
            Self::Skipped => "skipped",
            Self::Unavailable => "unavailable",
            Self::MissingImage => "missing image",
            Self::FetchFailed => "fetch failed",
            Self::WriteFailed => "write failed",
        };
        write!(f, "{}", s)
    }
}
