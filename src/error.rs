use snafu::prelude::*;

#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{operation}: queue is empty"))]
    EmptyQueue { operation: &'static str },
    #[snafu(display("invalid group size: {k}"))]
    InvalidGroupSize { k: usize },

    #[snafu(display("cannot allocate payload of {len} bytes"))]
    AllocPayload { len: usize },
    #[snafu(display("cannot allocate element"))]
    AllocElement,
}

/// The two ways an operation can fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    ResourceExhausted,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyQueue { .. } | Error::InvalidGroupSize { .. } => ErrorKind::InvalidArgument,
            Error::AllocPayload { .. } | Error::AllocElement => ErrorKind::ResourceExhausted,
        }
    }
}
