//! File-level status

use std::fmt;

/// Worst verdict seen in a file or a run.
///
/// Ordered by severity so that aggregating is a `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Success,
    Failure,
    Error,
}

impl Status {
    /// Process exit code: 0, 1 and 2.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Error => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Error => "error",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_dominates_failure() {
        let worst = [Status::Success, Status::Error, Status::Failure]
            .into_iter()
            .max()
            .unwrap_or_default();
        assert_eq!(worst, Status::Error);
        assert_eq!(Status::Failure.max(Status::Success), Status::Failure);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Status::Success.exit_code(), 0);
        assert_eq!(Status::Failure.exit_code(), 1);
        assert_eq!(Status::Error.exit_code(), 2);
    }
}
