// Registered source backends

/// The closed set of backends a spec string can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Live physical memory, streamed as a sparse image
    Ram,
    /// GPT partition, or a sub-range of one
    Partition,
    /// ACPI table
    Table,
    /// EFI variable
    Variable,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Ram,
        SourceKind::Partition,
        SourceKind::Table,
        SourceKind::Variable,
    ];

    /// Name used in spec strings
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Ram => "ram",
            SourceKind::Partition => "part",
            SourceKind::Table => "acpi",
            SourceKind::Variable => "efivar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}
