use thiserror::Error;

/// Validation failures for an incoming binding request. Each maps to a
/// specific STUN error code and reason phrase in the response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing USERNAME attribute")]
    MissingUsername,

    #[error("USERNAME is not in \"remoteUfrag:localUfrag\" format")]
    InvalidUsernameFormat,

    #[error("USERNAME's local ufrag does not match ours")]
    LocalUfragMismatch,

    #[error("missing MESSAGE-INTEGRITY attribute")]
    MissingMessageIntegrity,

    #[error("MESSAGE-INTEGRITY did not verify")]
    InvalidMessageIntegrity,

    #[error("FINGERPRINT did not verify")]
    FingerprintVerificationFailed,

    #[error("ICE-CONTROLLED present on a controlled (ICE-Lite) agent")]
    RoleConflict,
}

impl ValidationError {
    pub fn stun_code(&self) -> stun::attribute::error_code::NumericCode {
        use stun::attribute::error_code::NumericCode;
        match self {
            Self::MissingUsername => NumericCode::BadRequest,
            Self::InvalidUsernameFormat => NumericCode::BadRequest,
            Self::LocalUfragMismatch => NumericCode::Unauthenticated,
            Self::MissingMessageIntegrity => NumericCode::Unauthenticated,
            Self::InvalidMessageIntegrity => NumericCode::Unauthenticated,
            Self::FingerprintVerificationFailed => NumericCode::BadRequest,
            Self::RoleConflict => NumericCode::RoleConflict,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingUsername => "Missing USERNAME",
            Self::InvalidUsernameFormat => "Malformed USERNAME",
            Self::LocalUfragMismatch => "Unauthenticated",
            Self::MissingMessageIntegrity => "Unauthenticated",
            Self::InvalidMessageIntegrity => "Unauthenticated",
            Self::FingerprintVerificationFailed => "Bad Request",
            Self::RoleConflict => "Role Conflict",
        }
    }
}
