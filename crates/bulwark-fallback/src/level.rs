use std::fmt;

/// A degradation tier, in fixed order of preference.
///
/// The derived ordering is the order a chain tries them in:
/// `Primary < Replica < DistributedCache < LocalCache < BackupService < Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FallbackLevel {
    /// The authoritative source.
    Primary,
    /// A read replica of the primary.
    Replica,
    /// A shared cache.
    DistributedCache,
    /// An in-process cache.
    LocalCache,
    /// An alternative service.
    BackupService,
    /// A static default.
    Default,
}

impl FallbackLevel {
    /// Every level, in chain order.
    pub const ALL: [FallbackLevel; 6] = [
        FallbackLevel::Primary,
        FallbackLevel::Replica,
        FallbackLevel::DistributedCache,
        FallbackLevel::LocalCache,
        FallbackLevel::BackupService,
        FallbackLevel::Default,
    ];

    /// A result served from this level is degraded unless it is `Primary`.
    pub fn is_degraded(self) -> bool {
        self != FallbackLevel::Primary
    }

    /// Snake-case name used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackLevel::Primary => "primary",
            FallbackLevel::Replica => "replica",
            FallbackLevel::DistributedCache => "distributed_cache",
            FallbackLevel::LocalCache => "local_cache",
            FallbackLevel::BackupService => "backup_service",
            FallbackLevel::Default => "default",
        }
    }
}

impl fmt::Display for FallbackLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
