/// Errors returned by the stable matching solvers.
///
/// Structural variants are produced by validation before a table is touched,
/// `NoStableSolution` is the expected outcome of a roommates instance without
/// a stable matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Member names must be unique. Found duplicate entry '{0}'")]
    DuplicateMember(String),

    #[error("Table must be non-empty")]
    EmptyTable,

    #[error("Table must have an even number of members, found {0}")]
    OddMemberCount(usize),

    #[error("All member names must be non-blank")]
    BlankMember,

    #[error("Preference list for '{0}' does not contain all the required members")]
    IncompletePreferences(String),

    #[error("Preference list for '{0}' contains at least one unknown member")]
    UnknownMember(String),

    #[error("Tables must have distinct members. '{0}' found in both tables")]
    SharedMember(String),

    #[error("Tables must have the same number of members, found {0} and {1}")]
    MismatchedSizes(usize, usize),

    #[error("No stable solution exists")]
    NoStableSolution,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// True for errors caused by malformed input.
    pub fn is_structural(&self) -> bool {
        !matches!(self, MatchError::NoStableSolution | MatchError::Internal(_))
    }
}
