pub type Result<T> = std::result::Result<T, Error>;

pub const ENTITY_NOT_FOUND: &str = "{} Entity was not found";
pub const NOT_FOUND: &str = "There was no entity found";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection: `{0}`")]
    Connection(String),
    #[error("Database: `{0}`")]
    Database(String),
    #[error("Runtime: `{0}`")]
    Runtime(String),
    #[error("FromValue: `{0}`")]
    FromValue(String),
    #[error("OutOfRange: `{0}`")]
    OutOfRange(String),
    #[error("QueryBuilder: `{0}`")]
    QueryBuilder(String),
    #[error("Argument: `{0}`")]
    Argument(String),
    #[error("NotFound: `{0}`")]
    NotFound(String),
    #[error("Disposed: `{0}`")]
    Disposed(String),
}

impl Error {
    /// Generic not-found error, used when no single entity can be named
    pub fn not_found() -> Self {
        Self::NotFound(NOT_FOUND.into())
    }

    /// Not-found error naming the entity that was looked up
    pub fn entity_not_found(entity: &str) -> Self {
        Self::NotFound(ENTITY_NOT_FOUND.replacen("{}", entity, 1))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[macro_export]
macro_rules! connection {
    ($($arg:tt)*) => { $crate::Error::Connection(format!($($arg)*)) };
}

#[macro_export]
macro_rules! database {
    ($($arg:tt)*) => { $crate::Error::Database(format!($($arg)*)) };
}

#[macro_export]
macro_rules! runtime {
    ($($arg:tt)*) => { $crate::Error::Runtime(format!($($arg)*)) };
}

#[macro_export]
macro_rules! from_value {
    ($($arg:tt)*) => { $crate::Error::FromValue(format!($($arg)*)) };
}

#[macro_export]
macro_rules! out_of_range {
    ($($arg:tt)*) => { $crate::Error::OutOfRange(format!($($arg)*)) };
}

#[macro_export]
macro_rules! query_builder {
    ($($arg:tt)*) => { $crate::Error::QueryBuilder(format!($($arg)*)) };
}

#[macro_export]
macro_rules! argument {
    ($($arg:tt)*) => { $crate::Error::Argument(format!($($arg)*)) };
}

#[macro_export]
macro_rules! disposed {
    ($($arg:tt)*) => { $crate::Error::Disposed(format!($($arg)*)) };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        assert_eq!(
            Error::entity_not_found("User").to_string(),
            "NotFound: `User Entity was not found`"
        );
        assert_eq!(
            Error::not_found().to_string(),
            "NotFound: `There was no entity found`"
        );
        assert!(Error::not_found().is_not_found());
        assert!(!database!("x").is_not_found());
    }
}
