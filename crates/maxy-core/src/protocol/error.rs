//! Protocol errors

use thiserror::Error;

/// Errors that can occur while encoding or sending module messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A message field is outside its allowed range
    #[error(
        "Parameter '{field}' is outside the allowed range. \
         Got '{value}', expected it to be {min}-{max}"
    )]
    OutOfRange {
        /// Field name as it appears on the wire
        field: &'static str,
        /// Rejected value
        value: i64,
        /// Lowest allowed value
        min: i64,
        /// Highest allowed value
        max: i64,
    },

    /// The module kind does not support the request
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The write did not complete in time
    #[error("Write timeout")]
    Timeout,

    /// No transport is attached
    #[error("Not connected to display modules")]
    NotConnected,

    /// The serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Name or handle does not match a registered unit
    #[error("No module or sub-module named '{0}'")]
    UnknownUnit(String),

    /// Configuration could not be parsed or serialized
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Other I/O failure on the transport or a config file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether this error came from the link rather than from the caller's input
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::Timeout | ProtocolError::SerialError(_) | ProtocolError::IoError(_)
        )
    }
}

/// Check `value` against the closed range `[min, max]`
pub(crate) fn check_range<V, B>(
    field: &'static str,
    value: V,
    min: B,
    max: B,
) -> Result<(), ProtocolError>
where
    V: Into<i64>,
    B: Into<i64>,
{
    let (value, min, max) = (value.into(), min.into(), max.into());
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ProtocolError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_bounds_inclusive() {
        assert!(check_range("intensity", 0u8, 0u8, 15u8).is_ok());
        assert!(check_range("intensity", 15u8, 0u8, 15u8).is_ok());
        assert!(check_range("intensity", 16u8, 0u8, 15u8).is_err());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = check_range("module_index", 64u8, 0u8, 63u8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter 'module_index' is outside the allowed range. \
             Got '64', expected it to be 0-63"
        );
    }

    #[test]
    fn test_transport_failure_classification() {
        assert!(ProtocolError::Timeout.is_transport_failure());
        assert!(ProtocolError::SerialError("gone".into()).is_transport_failure());
        assert!(!ProtocolError::NotConnected.is_transport_failure());
        assert!(!ProtocolError::UnsupportedOperation("x".into()).is_transport_failure());
    }
}
