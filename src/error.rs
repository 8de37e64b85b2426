use std::process::ExitStatus;

use hyper::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::response::{ApiHeader, SingleLine};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid directory identifier")]
    InvalidIdentifier,
    #[error("cannot find directory")]
    NotFound,
    #[error("cannot start archiver")]
    SpawnError(#[source] std::io::Error),
    #[error("archiver exited with failure ({0})")]
    NonZeroExit(ExitStatus),
    #[error("cannot read archiver output")]
    OutputRead(#[source] std::io::Error),
    #[error("cannot retrieve archiver exit status")]
    Wait(#[source] std::io::Error),
    #[error("cannot write to client")]
    StreamWriteFailure,
    #[error("download cancelled")]
    Cancelled,
    #[error("download timed out")]
    Timeout,
    #[error("invalid response header")]
    Header,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            InvalidIdentifier => StatusCode::NOT_FOUND,
            NotFound => StatusCode::NOT_FOUND,
            SpawnError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NonZeroExit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OutputRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Wait(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StreamWriteFailure => StatusCode::BAD_REQUEST,
            Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Timeout => StatusCode::REQUEST_TIMEOUT,
            Header => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the session ended because the download was interrupted from the
    /// outside, rather than because something went wrong on the server.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            Error::Cancelled | Error::StreamWriteFailure | Error::Timeout
        )
    }
}

impl ApiHeader for Error {
    fn status_code(&self) -> StatusCode {
        Error::status_code(self)
    }

    fn success(&self) -> bool {
        false
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Error", 1)?;
        state.serialize_field("error", &self.to_string())?;
        state.end()
    }
}

impl SingleLine for Error {
    fn single_lined(&self) -> String {
        self.to_string()
    }
}

pub mod resolve {
    pub use super::Error::{InvalidIdentifier, NotFound};
}

pub mod archive {
    pub use super::Error::{
        Cancelled, Header, NonZeroExit, OutputRead, SpawnError, StreamWriteFailure, Timeout, Wait,
    };
}

#[cfg(test)]
mod tests {
    use hyper::StatusCode;

    use super::Error;

    #[test]
    fn resolution_errors_look_alike() {
        assert_eq!(Error::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::InvalidIdentifier.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn interruptions() {
        assert!(Error::Cancelled.is_interruption());
        assert!(Error::StreamWriteFailure.is_interruption());
        assert!(Error::Timeout.is_interruption());
        assert!(!Error::NotFound.is_interruption());
        assert!(!Error::SpawnError(std::io::ErrorKind::NotFound.into()).is_interruption());
    }

    #[test]
    fn serialize() {
        assert_eq!(
            serde_json::to_string(&Error::NotFound).unwrap(),
            r#"{"error":"cannot find directory"}"#
        );
    }
}
