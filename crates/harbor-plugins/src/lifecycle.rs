//! The plugin lifecycle state machine.
//!
//! Every registry entry carries a [`LifecycleState`]. The host validates
//! each requested transition against [`LifecycleState::can_transition`], and
//! [`may_execute`] decides whether an entry's current state (combined with
//! the plugin's [`ActivationPolicy`]) permits execution.

use std::fmt;

use crate::contract::ActivationPolicy;

/// Runtime state of a registry entry.
///
/// `Unloaded` is never stored: an entry is present in the registry exactly
/// while its state is something else, and lookups of absent identifiers
/// report `Unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Not present in the registry.
    Unloaded,
    /// Constructed and initialised, not yet activated.
    Loaded,
    /// Eligible for execution.
    Activated,
    /// Present but withdrawn from execution.
    Deactivated,
}

impl LifecycleState {
    /// Returns the lower-case identifier for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
        }
    }

    /// Reports whether the transition `self` → `to` is part of the state
    /// machine.
    ///
    /// Unloading is permitted from every loaded state; activation from
    /// `Loaded` or `Deactivated` (re-activation); deactivation only from
    /// `Activated`.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Loaded | Self::Activated | Self::Deactivated, Self::Unloaded)
                | (Self::Loaded | Self::Deactivated, Self::Activated)
                | (Self::Activated, Self::Deactivated)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports whether a plugin in `state` with `policy` may execute.
///
/// `Activated` always permits execution. `Loaded` permits it only for
/// plugins whose activation policy is [`ActivationPolicy::OnLoad`].
#[must_use]
pub const fn may_execute(state: LifecycleState, policy: ActivationPolicy) -> bool {
    match state {
        LifecycleState::Activated => true,
        LifecycleState::Loaded => matches!(policy, ActivationPolicy::OnLoad),
        LifecycleState::Unloaded | LifecycleState::Deactivated => false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::load_then_activate(LifecycleState::Loaded, LifecycleState::Activated, true)]
    #[case::reactivate(LifecycleState::Deactivated, LifecycleState::Activated, true)]
    #[case::deactivate(LifecycleState::Activated, LifecycleState::Deactivated, true)]
    #[case::unload_loaded(LifecycleState::Loaded, LifecycleState::Unloaded, true)]
    #[case::unload_active(LifecycleState::Activated, LifecycleState::Unloaded, true)]
    #[case::unload_deactivated(LifecycleState::Deactivated, LifecycleState::Unloaded, true)]
    #[case::double_activate(LifecycleState::Activated, LifecycleState::Activated, false)]
    #[case::deactivate_loaded(LifecycleState::Loaded, LifecycleState::Deactivated, false)]
    #[case::resurrect(LifecycleState::Unloaded, LifecycleState::Loaded, false)]
    fn transition_matrix(
        #[case] from: LifecycleState,
        #[case] to: LifecycleState,
        #[case] permitted: bool,
    ) {
        assert_eq!(from.can_transition(to), permitted);
    }

    #[rstest]
    #[case::activated_explicit(LifecycleState::Activated, ActivationPolicy::Explicit, true)]
    #[case::activated_on_load(LifecycleState::Activated, ActivationPolicy::OnLoad, true)]
    #[case::loaded_on_load(LifecycleState::Loaded, ActivationPolicy::OnLoad, true)]
    #[case::loaded_explicit(LifecycleState::Loaded, ActivationPolicy::Explicit, false)]
    #[case::deactivated(LifecycleState::Deactivated, ActivationPolicy::OnLoad, false)]
    fn execution_permission(
        #[case] state: LifecycleState,
        #[case] policy: ActivationPolicy,
        #[case] permitted: bool,
    ) {
        assert_eq!(may_execute(state, policy), permitted);
    }
}
