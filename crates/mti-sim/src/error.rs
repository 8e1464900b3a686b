//! Errors that abort a simulation run.

use mti_types::{ConfigInvalid, PartitionViolation};

/// A run that could not produce trustworthy statistics.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The protocol kept issuing commands past the slot ceiling.
    #[error("protocol {protocol} exceeded the slot limit of {limit} without finishing")]
    SlotLimitExceeded { protocol: &'static str, limit: u64 },

    /// The protocol finished with sets that do not partition the population.
    #[error("protocol {protocol} finished without partitioning the expected tags: {violation}")]
    PartitionViolated {
        protocol: &'static str,
        #[source]
        violation: PartitionViolation,
    },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigInvalid),
}

impl SimError {
    /// Returns true for protocol failures, as opposed to caller mistakes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SlotLimitExceeded { .. } | Self::PartitionViolated { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_failures_are_fatal() {
        let err = SimError::SlotLimitExceeded {
            protocol: "stuck",
            limit: 10,
        };
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "protocol stuck exceeded the slot limit of 10 without finishing"
        );
    }

    #[test]
    fn config_errors_are_not_fatal() {
        let err = SimError::from(ConfigInvalid {
            field: "bit_error_rate",
            value: "2".to_string(),
            reason: "must be within [0, 1]",
        });
        assert!(!err.is_fatal());
    }
}
