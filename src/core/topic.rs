//! Segmented MQTT topics.
//!
//! Control topics are matched segment by segment with exact arity: a pattern
//! of one segment never matches a topic of two, and an absent segment only
//! matches an absent segment.

use core::fmt;

/// Maximum depth of a structured topic.
pub const MAX_SEGMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic<'a> {
    segments: [Option<&'a str>; MAX_SEGMENTS],
}

impl<'a> Topic<'a> {
    /// Build a pattern from a fixed list of segments.
    ///
    /// Evaluated in a const context an invalid arity fails the build.
    pub const fn from_static(segments: &[&'a str]) -> Self {
        assert!(
            !segments.is_empty() && segments.len() <= MAX_SEGMENTS,
            "topic must have 1 to 3 segments"
        );
        let mut out = [None; MAX_SEGMENTS];
        let mut i = 0;
        while i < segments.len() {
            out[i] = Some(segments[i]);
            i += 1;
        }
        Self { segments: out }
    }

    /// Split a `/` separated path.
    ///
    /// Returns `None` for an empty path or one deeper than [`MAX_SEGMENTS`].
    pub fn parse(path: &'a str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }
        let mut segments = [None; MAX_SEGMENTS];
        for (i, segment) in path.split('/').enumerate() {
            *segments.get_mut(i)? = Some(segment);
        }
        Some(Self { segments })
    }

    /// Number of present segments.
    pub fn arity(&self) -> usize {
        self.segments.iter().take_while(|s| s.is_some()).count()
    }

    pub fn segments(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.segments.iter().map_while(|s| *s)
    }

    /// Exact per-segment comparison, absence included.
    pub fn matches(&self, other: &Topic<'_>) -> bool {
        self.segments == other.segments
    }
}

impl fmt::Display for Topic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
