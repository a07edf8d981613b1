use std::fmt;

macro_rules! impl_from_for_signedint {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(v: $ty) -> Self {
                    Self::SignedInt(v as i64)
                }
            }
        )+
    };
}

macro_rules! impl_from_for_unsignedint {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(v: $ty) -> Self {
                    Self::UnsignedInt(v as u64)
                }
            }
        )+
    };
}

macro_rules! impl_from_for_float {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(v: $ty) -> Self {
                    Self::Float(v as f64)
                }
            }
        )+
    };
}

macro_rules! impl_from_for_column {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(v: $ty) -> Self {
                    Self::Column(v.to_string())
                }
            }
        )+
    };
}

/// A literal inside a query. Strings become columns or the `?`
/// placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    SignedInt(i64),
    UnsignedInt(u64),
    Float(f64),
    Column(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::SignedInt(v) => write!(f, "{}", v),
            Self::UnsignedInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Column(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl_from_for_signedint! {i8, i16, i32, i64}
impl_from_for_unsignedint! {u8, u16, u32, u64}
impl_from_for_float! {f32, f64}
impl_from_for_column! {&str, String, &String}
