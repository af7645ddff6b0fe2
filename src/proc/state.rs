//! Process states (spec.md §3): a closed four-state set.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ProcessState {
    /// Slot is free.
    #[default]
    Available,
    /// Runnable but not running.
    Ready,
    /// Currently executing on the hart.
    Running,
    /// Parked until a wake-up deadline or an external event.
    Sleeping,
}
