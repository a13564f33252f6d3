use std::io;

/// Fatal conditions raised by the engine.
///
/// Recoverable situations (parameter clamps, zero accuracy sums, empty match
/// sets) are absorbed where they occur and never surface here. Everything in
/// this enum means the learning state can no longer be trusted.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LcsError {
    #[display("population numerosity is {actual}, expected {expected}")]
    NumerosityMismatch { expected: u64, actual: u64 },
    #[display("cannot delete from an empty population")]
    EmptyPopulation,
    #[display("covering did not reach {required} actions after {attempts} attempts")]
    CoveringExhausted { required: usize, attempts: usize },
    #[display("expected {kind} of length {expected}, got {actual}")]
    DimensionMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[display("no trial in progress")]
    NoTrial,
    #[display("malformed persisted state: {reason}")]
    MalformedState { reason: String },
    #[display("I/O error: {_0}")]
    Io(io::Error),
}

impl LcsError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedState {
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for LcsError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            return Self::malformed("unexpected end of data");
        }
        Self::Io(err)
    }
}
