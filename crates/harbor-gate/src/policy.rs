//! Policy flags steering how strictly sources are scanned.

/// Scan policy derived from the executor's configuration.
///
/// The policy controls the optional parts of the gate: the shell
/// metacharacter scan runs only when `sandboxed` is set, and the file and
/// network pattern groups are skipped when the corresponding access flag has
/// been granted. The defaults are the strictest combination.
///
/// # Example
///
/// ```rust,no_run
/// use harbor_gate::GatePolicy;
///
/// let policy = GatePolicy::new().permit_file_access();
/// assert!(policy.sandboxed());
/// assert!(policy.allows_file_access());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    sandboxed: bool,
    allow_network: bool,
    allow_file_access: bool,
}

impl GatePolicy {
    /// Creates the default policy: sandboxed, no network, no file access.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sandboxed: true,
            allow_network: false,
            allow_file_access: false,
        }
    }

    /// Disables the shell-specific metacharacter and command scan.
    #[must_use]
    pub const fn unsandboxed(mut self) -> Self {
        self.sandboxed = false;
        self
    }

    /// Skips the network pattern group during the denylist scan.
    #[must_use]
    pub const fn permit_network(mut self) -> Self {
        self.allow_network = true;
        self
    }

    /// Skips the file-access pattern group during the denylist scan.
    #[must_use]
    pub const fn permit_file_access(mut self) -> Self {
        self.allow_file_access = true;
        self
    }

    /// Returns `true` when the shell-specific scan applies.
    #[must_use]
    pub const fn sandboxed(&self) -> bool {
        self.sandboxed
    }

    /// Returns `true` when network-touching patterns are tolerated.
    #[must_use]
    pub const fn allows_network(&self) -> bool {
        self.allow_network
    }

    /// Returns `true` when file-touching patterns are tolerated.
    #[must_use]
    pub const fn allows_file_access(&self) -> bool {
        self.allow_file_access
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new()
    }
}
