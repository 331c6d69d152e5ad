//! Error types for the `simsims-world` crate.
//!
//! Transient unavailability of a resource is not an error: a failed
//! reservation is an ordinary `false` and the caller retries on its next
//! cycle. Only configuration and thread-spawn failures surface here.

use simsims_types::PlaceId;

/// Errors that can occur while building or running a world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A required place kind has no instances, so transitions cannot be wired.
    #[error(
        "world cannot run: need at least one of each place \
         (barracks={barracks}, storages={storages}, barns={barns})"
    )]
    Unwireable {
        /// Configured barrack count.
        barracks: usize,
        /// Configured storage count.
        storages: usize,
        /// Configured barn count.
        barns: usize,
    },

    /// A binding referenced a place that is not in the arena.
    #[error("place not found: {0}")]
    PlaceNotFound(PlaceId),

    /// The binding's place kind does not match the slot it was assigned to.
    #[error("place {place} cannot be bound where a {expected} is required")]
    KindMismatch {
        /// The place that was offered.
        place: PlaceId,
        /// The kind the slot requires.
        expected: simsims_types::PlaceKind,
    },

    /// An actor or control-loop thread could not be started.
    #[error("failed to spawn thread {name}: {source}")]
    Spawn {
        /// Name of the thread that failed to start.
        name: String,
        /// The underlying OS error.
        source: std::io::Error,
    },
}
