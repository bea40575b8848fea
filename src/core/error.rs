use crate::api::RemoteFailure;
use std::error::Error;
use std::fmt;

/// Input fields that can be rejected before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Message,
    Agent,
    Name,
    Credential,
    ProviderId,
    BaseUrl,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Message => "message",
            Field::Agent => "agent",
            Field::Name => "name",
            Field::Credential => "credential",
            Field::ProviderId => "provider_id",
            Field::BaseUrl => "base_url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Required,
    TooLong { max: usize, actual: usize },
    NothingToUpdate,
}

/// A request rejected locally. The remote was never contacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: Field,
    pub reason: ValidationReason,
}

impl ValidationFailure {
    pub fn required(field: Field) -> Self {
        Self {
            field,
            reason: ValidationReason::Required,
        }
    }

    pub fn too_long(field: Field, max: usize, actual: usize) -> Self {
        Self {
            field,
            reason: ValidationReason::TooLong { max, actual },
        }
    }

    pub fn nothing_to_update(field: Field) -> Self {
        Self {
            field,
            reason: ValidationReason::NothingToUpdate,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.as_str();
        match self.reason {
            ValidationReason::Required => write!(f, "{field} is required"),
            ValidationReason::TooLong { max, actual } => {
                write!(f, "{field} must be at most {max} characters (got {actual})")
            }
            ValidationReason::NothingToUpdate => write!(f, "no changes given for {field}"),
        }
    }
}

impl Error for ValidationFailure {}

/// An operation of the same kind is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyFailure {
    pub operation: &'static str,
}

impl fmt::Display for ConcurrencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is already in progress", self.operation)
    }
}

impl Error for ConcurrencyFailure {}

/// Every way a session or configuration operation can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Validation(ValidationFailure),
    Remote(RemoteFailure),
    Concurrency(ConcurrencyFailure),
}

impl Failure {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Failure::Remote(remote) if remote.is_not_found())
    }

    /// Name of the offending input, when one is known.
    pub fn field(&self) -> Option<&str> {
        match self {
            Failure::Validation(validation) => Some(validation.field.as_str()),
            Failure::Remote(remote) => remote.field(),
            Failure::Concurrency(_) => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Validation(err) => write!(f, "invalid input: {err}"),
            Failure::Remote(err) => write!(f, "{err}"),
            Failure::Concurrency(err) => write!(f, "{err}"),
        }
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Failure::Validation(err) => Some(err),
            Failure::Remote(err) => Some(err),
            Failure::Concurrency(err) => Some(err),
        }
    }
}

impl From<ValidationFailure> for Failure {
    fn from(err: ValidationFailure) -> Self {
        Failure::Validation(err)
    }
}

impl From<RemoteFailure> for Failure {
    fn from(err: RemoteFailure) -> Self {
        Failure::Remote(err)
    }
}

impl From<ConcurrencyFailure> for Failure {
    fn from(err: ConcurrencyFailure) -> Self {
        Failure::Concurrency(err)
    }
}
