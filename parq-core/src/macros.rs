/// Schema-mismatch error as an `Err` value.
#[macro_export]
macro_rules! schema_err {
    ($($args:tt)*) => {
        Err($crate::errors::Error::Schema(format!($($args)*)))
    };
}

/// Encoding-range error as an `Err` value.
#[macro_export]
macro_rules! encoding_err {
    ($($args:tt)*) => {
        Err($crate::errors::Error::Encoding(format!($($args)*)))
    };
}

/// Wrong-lifecycle-state error as an `Err` value.
#[macro_export]
macro_rules! illegal_state_err {
    ($($args:tt)*) => {
        Err($crate::errors::Error::IllegalState(format!($($args)*)))
    };
}

/// Invariant-violation error as an `Err` value.
#[macro_export]
macro_rules! internal_err {
    ($($args:tt)*) => {
        Err($crate::errors::Error::Internal(format!($($args)*)))
    };
}
