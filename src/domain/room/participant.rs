//! Participant roles inside a room.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Role a connected user plays in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    Viewer,
    Expert,
    Examinee,
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParticipantType::Viewer => "viewer",
            ParticipantType::Expert => "expert",
            ParticipantType::Examinee => "examinee",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ParticipantType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(ParticipantType::Viewer),
            "expert" => Ok(ParticipantType::Expert),
            "examinee" => Ok(ParticipantType::Examinee),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown participant type: {}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Expert".parse::<ParticipantType>().unwrap(), ParticipantType::Expert);
        assert_eq!("viewer".parse::<ParticipantType>().unwrap(), ParticipantType::Viewer);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = "host".parse::<ParticipantType>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
