use std::{cmp::Ordering, fmt, sync::Arc};

/// Stable key for a zone at any level.
/// Keeps the source text (with leading zeros) but avoids repeated owned Strings.
///
/// Ordering is numeric when both ids are plain unsigned integers and
/// lexicographic otherwise, with integers sorting before everything else.
/// Two integer ids that differ only in leading zeros ("07" vs "7") fall back
/// to text order, so the ordering stays total and agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneId(Arc<str>);

impl ZoneId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }

    /// Numeric value of the id, if it is a plain unsigned integer.
    fn numeric(&self) -> Option<u128> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) { return None }
        self.0.parse().ok()
    }
}

impl Ord for ZoneId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ZoneId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self { Self(Arc::from(id)) }
}
