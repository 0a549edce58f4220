use crate::oracle::OracleError;

/// Fatal errors that abort a simulation run.
///
/// An unusable moderator answer is not in this list: it is always recovered
/// by picking a student at random.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("The classroom has no students")]
    EmptyRoster,
    #[error("The round budget must be at least 1")]
    InvalidRounds,
    #[error("The opening message is empty")]
    EmptyOpeningMessage,
    #[error("No valid student is selected (selected index: {0:?})")]
    NoStudentSelected(Option<usize>),
    #[error("Oracle failed while {speaker} was taking a turn")]
    Oracle {
        speaker: String,
        #[source]
        source: OracleError,
    },
    #[error("Failed to write the transcript: {0}")]
    Transcript(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_oracle_error_keeps_its_source() {
        let err = SimulationError::Oracle {
            speaker: "Moderator".to_string(),
            source: OracleError::EmptyResponse,
        };
        assert_eq!(err.to_string(), "Oracle failed while Moderator was taking a turn");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Oracle returned no content".to_string())
        );
    }
}
