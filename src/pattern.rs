//! Compile-time dispatch over the two regex flavors.
//!
//! Lines are matched either as `str` with [`regex::Regex`] or as raw bytes
//! with [`regex::bytes::Regex`]. The [`Pattern`] trait is sealed; those two
//! are the only implementations.

use crate::batch::AsText;

mod sealed {
    pub trait Sealed {}

    impl Sealed for regex::Regex {}
    impl Sealed for regex::bytes::Regex {}
}

pub trait Pattern: sealed::Sealed {
    /// The text representation a line is matched as.
    type Haystack: ?Sized + AsText + 'static;

    /// Reusable buffer holding the group spans of the last match.
    type Locations;

    /// Group names in group-index order; index 0 is the whole match.
    fn group_names(&self) -> impl Iterator<Item = Option<&str>>;

    fn locations(&self) -> Self::Locations;

    /// Matches `hay`, leaving group spans in `locs`. Returns false on no match.
    fn read_into(&self, locs: &mut Self::Locations, hay: &Self::Haystack) -> bool;

    fn span(locs: &Self::Locations, group: usize) -> Option<(usize, usize)>;

    fn slice(hay: &Self::Haystack, start: usize, end: usize) -> &Self::Haystack;

    fn empty() -> &'static Self::Haystack;
}

impl Pattern for regex::Regex {
    type Haystack = str;
    type Locations = regex::CaptureLocations;

    fn group_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.capture_names()
    }

    fn locations(&self) -> Self::Locations {
        self.capture_locations()
    }

    fn read_into(&self, locs: &mut Self::Locations, hay: &str) -> bool {
        self.captures_read(locs, hay).is_some()
    }

    fn span(locs: &Self::Locations, group: usize) -> Option<(usize, usize)> {
        locs.get(group)
    }

    fn slice(hay: &str, start: usize, end: usize) -> &str {
        &hay[start..end]
    }

    fn empty() -> &'static str {
        ""
    }
}

impl Pattern for regex::bytes::Regex {
    type Haystack = [u8];
    type Locations = regex::bytes::CaptureLocations;

    fn group_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.capture_names()
    }

    fn locations(&self) -> Self::Locations {
        self.capture_locations()
    }

    fn read_into(&self, locs: &mut Self::Locations, hay: &[u8]) -> bool {
        self.captures_read(locs, hay).is_some()
    }

    fn span(locs: &Self::Locations, group: usize) -> Option<(usize, usize)> {
        locs.get(group)
    }

    fn slice(hay: &[u8], start: usize, end: usize) -> &[u8] {
        &hay[start..end]
    }

    fn empty() -> &'static [u8] {
        b""
    }
}
