//! Default values for closure-diff configuration.

/// Depth past which version bumps and fixed-output rebuilds are not expanded.
pub const DEFAULT_MAX_LEVEL: u32 = 0;

/// Store query executable.
pub const DEFAULT_NIX_STORE: &str = "nix-store";

/// Lifetime of persisted store query answers, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Symlink to the running system.
pub const DEFAULT_CURRENT_SYSTEM: &str = "/run/current-system";

/// Command whose output names the system recipe that a rebuild would produce.
pub const DEFAULT_REBUILD_COMMAND: &[&str] = &["nixos-rebuild", "dry-build"];
