use std::{error::Error, fmt};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, FtrlErr>;

/// Precondition failures reported by the FTRL operators.
///
/// Every variant is produced before any buffer is written, a rejected call
/// leaves weights and accumulators exactly as they were.
#[derive(Debug)]
pub enum FtrlErr {
    GradientLengthMismatch {
        got: usize,
        expected: usize,
    },
    AccumulatorLengthMismatch {
        got: usize,
        expected: usize,
    },
    OutputLengthMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    RowMismatch {
        len: usize,
        rows: usize,
    },
    IndexOutOfBounds {
        position: usize,
        index: i128,
        rows: usize,
    },
    InvalidParam {
        name: &'static str,
        value: f64,
    },
    Config(serde_json::Error),
}

impl fmt::Display for FtrlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtrlErr::GradientLengthMismatch { got, expected } => {
                write!(f, "gradient length mismatch: got {got}, expected {expected}")
            }
            FtrlErr::AccumulatorLengthMismatch { got, expected } => write!(
                f,
                "accumulator length mismatch: got {got}, expected {expected} (2 per weight)"
            ),
            FtrlErr::OutputLengthMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "output {what} length mismatch: got {got}, expected {expected}"
            ),
            FtrlErr::RowMismatch { len, rows } => write!(
                f,
                "weights of length {len} can't be split into {rows} rows of equal size"
            ),
            FtrlErr::IndexOutOfBounds {
                position,
                index,
                rows,
            } => write!(
                f,
                "index out of bounds at position {position}: {index}, range 0 to {rows}"
            ),
            FtrlErr::InvalidParam { name, value } => {
                write!(f, "invalid ftrl parameter {name}: {value}")
            }
            FtrlErr::Config(e) => write!(f, "invalid ftrl config: {e}"),
        }
    }
}

impl Error for FtrlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FtrlErr::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FtrlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}
