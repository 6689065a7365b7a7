/// Level of a zone in the crosswalk hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneLevel {
    Fine,       // Lowest-level zone, nests in a medium zone
    Medium,     // Union of fine zones
    Coarse,     // Independent system, not aligned with medium zones
}

impl ZoneLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            ZoneLevel::Fine => "fine",
            ZoneLevel::Medium => "medium",
            ZoneLevel::Coarse => "coarse",
        }
    }
}

impl std::fmt::Display for ZoneLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}
