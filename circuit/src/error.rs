use alloc::string::String;

use thiserror::Error;

/// Errors that can abort graph construction or witness evaluation.
///
/// Evaluation is all-or-nothing: none of these are retried or locally
/// recovered, and no partial signal vector escapes a failed run. The
/// variants fall into four classes:
///
/// - constraint violations (`ConstraintViolation`) — the supplied inputs do
///   not satisfy the circuit;
/// - arithmetic errors (`DivisionByZero`, `IndexOverflow`);
/// - graph-consistency failures (`InputAfterRun` through `NotAnInput`) — a
///   scheduler invariant was broken, which indicates a malformed compiled
///   graph rather than bad user data;
/// - input errors (`MissingInput`, `UnknownInput`, `InputLengthMismatch`)
///   and build-time validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// An assertion predicate evaluated to false. Carries the owning
    /// template's name, the source tag of the failing check, and the dotted
    /// chain of component names from the root to the failing instance.
    #[error("constraint `{tag}` failed in template {template}, component trace: {path}")]
    ConstraintViolation {
        template: String,
        tag: &'static str,
        path: String,
    },

    /// Multiplicative inverse of zero was requested.
    #[error("division by zero")]
    DivisionByZero,

    /// A field value used as an index or loop bound exceeds the host's
    /// representable range.
    #[error("field value {value} does not fit in a host index")]
    IndexOverflow { value: u64 },

    /// An input arrived at a component that already finished.
    #[error("input supplied to finished component {path}")]
    InputAfterRun { path: String },

    /// An input arrived at a component whose program is currently running.
    #[error("input supplied to running component {path}")]
    InputWhileRunning { path: String },

    /// A component was dispatched with inputs still outstanding.
    #[error("component {path} executed with {remaining} inputs outstanding")]
    PrematureRun { path: String, remaining: usize },

    /// Single static assignment was violated.
    #[error("signal {index} assigned twice")]
    SignalReassigned { index: usize },

    /// A signal was read before its producer ran.
    #[error("signal {index} read before assignment")]
    SignalUnset { index: usize },

    /// A signal was still unassigned when the run completed.
    #[error("signal {index} never assigned")]
    SignalNeverAssigned { index: usize },

    /// A component was instantiated but its program never executed.
    #[error("component {path} never executed")]
    InstanceNeverRan { path: String },

    /// A program referenced a subcomponent slot the template does not declare.
    #[error("template {template} has no subcomponent slot {slot}")]
    ChildSlotOutOfRange { template: String, slot: usize },

    /// A program referenced a local signal outside the template's footprint.
    #[error("local signal {index} outside template {template}")]
    LocalIndexOutOfRange { template: String, index: usize },

    /// A wire targeted a child signal that is not a declared input.
    #[error("signal {index} of template {template} is not a declared input")]
    NotAnInput { template: String, index: usize },

    /// A required primary input was never supplied.
    #[error("primary input `{name}` was never supplied")]
    MissingInput { name: String },

    /// A supplied primary input does not correspond to any declared binding.
    #[error("unknown primary input `{name}`")]
    UnknownInput { name: String },

    /// A supplied primary input has the wrong number of values.
    #[error("primary input `{name}` expects {expected} values, got {got}")]
    InputLengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// `build()` was called without a main template.
    #[error("graph has no main template")]
    MissingMain,

    /// A template transitively instantiates itself.
    #[error("template {template} instantiates itself recursively")]
    RecursiveTemplate { template: String },

    /// A subcomponent spec references a template id that was never registered.
    #[error("template {parent} references undefined template {child}")]
    UnknownTemplate { parent: String, child: u32 },

    /// A template's declared counts are inconsistent.
    #[error("template {template}: {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },

    /// A primary-input binding does not line up with the main template's
    /// declared input segment.
    #[error("input binding `{name}`: {reason}")]
    InvalidInputBinding {
        name: String,
        reason: &'static str,
    },
}
