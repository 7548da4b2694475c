//! Run outcomes and the public status tokens they collapse onto

use crate::error::Result;
use std::fmt;

/// Result of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every managed record already held the resolved address
    NoChange,
    /// At least one record was created or updated
    Success,
}

/// Internal status taxonomy of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoChange,
    Success,
    Failure,
    DetectionFailed,
    InvalidAddress,
    ProviderQueryFailed,
    MissingCredentials,
}

impl Status {
    /// Status of a finished run
    pub fn of(result: &Result<Outcome>) -> Self {
        match result {
            Ok(Outcome::NoChange) => Status::NoChange,
            Ok(Outcome::Success) => Status::Success,
            Err(e) => e.status(),
        }
    }

    /// Token printed for the caller: `good`, `nochg` or `badauth`
    pub fn token(self) -> &'static str {
        match self {
            Status::Success => "good",
            Status::NoChange => "nochg",
            _ => "badauth",
        }
    }

    /// Whether the run should end with a non-zero exit
    pub fn is_fatal(self) -> bool {
        !matches!(self, Status::Success | Status::NoChange)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressFamily;
    use crate::error::Error;

    #[test]
    fn tokens_collapse_to_three_values() {
        assert_eq!(Status::Success.token(), "good");
        assert_eq!(Status::NoChange.token(), "nochg");
        for status in [
            Status::Failure,
            Status::DetectionFailed,
            Status::InvalidAddress,
            Status::ProviderQueryFailed,
            Status::MissingCredentials,
        ] {
            assert_eq!(status.token(), "badauth");
            assert!(status.is_fatal());
        }
        assert!(!Status::Success.is_fatal());
        assert!(!Status::NoChange.is_fatal());
    }

    #[test]
    fn status_of_results() {
        assert_eq!(Status::of(&Ok(Outcome::Success)), Status::Success);
        assert_eq!(Status::of(&Ok(Outcome::NoChange)), Status::NoChange);
        let failed: Result<Outcome> = Err(Error::detection_failed(AddressFamily::V4, "exhausted"));
        assert_eq!(Status::of(&failed), Status::DetectionFailed);
    }
}
