use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported frame shape {0:?}: expected (height, width) or (height, width, 3|4)")]
    FrameShape(Vec<usize>),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("frame {index} is unavailable: {reason}")]
    FrameUnavailable { index: usize, reason: String },

    #[error("frame {index} is out of range for a sequence of {len} frames")]
    FrameOutOfRange { index: usize, len: usize },

    #[error("frame {frame} is out of order: last committed frame is {last}")]
    OutOfOrder { frame: usize, last: usize },
}

impl Error {
    #[inline]
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
