use std::collections::TryReserveError;

#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// An index is larger than the size of the container it refers to
    IndexOutOfRange {
        /// the offending index
        index: usize,
        /// size of the indexed container
        size: usize,
    },
    /// Could not allocate memory for a pair list or one of its helpers
    OutOfMemory(TryReserveError),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::IndexOutOfRange { index, size } => write!(
                f, "index out of range: got {} but the size is {}", index, size
            ),
            Error::OutOfMemory(e) => write!(f, "out of memory: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::IndexOutOfRange { .. } => None,
            Error::OutOfMemory(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

impl From<TryReserveError> for Error {
    fn from(error: TryReserveError) -> Error {
        Error::OutOfMemory(error)
    }
}

/// Check that `index` is smaller than `size`
pub(crate) fn check_index(index: usize, size: usize) -> Result<(), Error> {
    if index < size {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let error = Error::InvalidParameter("cutoff must be positive".into());
        assert_eq!(error.to_string(), "invalid parameter: cutoff must be positive");

        let error = Error::IndexOutOfRange { index: 12, size: 4 };
        assert_eq!(error.to_string(), "index out of range: got 12 but the size is 4");

        assert!(check_index(3, 4).is_ok());
        assert!(matches!(check_index(4, 4), Err(Error::IndexOutOfRange { index: 4, size: 4 })));
    }

    #[test]
    fn out_of_memory() {
        let mut data = Vec::<u64>::new();
        let error = Error::from(data.try_reserve(usize::MAX).unwrap_err());
        assert!(matches!(error, Error::OutOfMemory(_)));
        assert!(std::error::Error::source(&error).is_some());
    }
}
