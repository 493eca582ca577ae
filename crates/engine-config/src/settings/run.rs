use crate::error::ConfigError;
use std::time::Duration;

/// Knobs for a single catalog run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// Overall budget for the run. Operations still pending when it elapses
    /// are reported as timed out.
    pub deadline: Option<Duration>,
}

impl RunSettings {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builds settings from a deadline given in whole seconds. Zero is rejected.
    pub fn from_deadline_secs(secs: Option<u64>) -> Result<Self, ConfigError> {
        match secs {
            None => Ok(Self::default()),
            Some(0) => Err(ConfigError::InvalidSetting {
                key: "deadline".to_string(),
                message: "must be at least one second".to_string(),
            }),
            Some(secs) => Ok(Self::default().with_deadline(Duration::from_secs(secs))),
        }
    }
}
