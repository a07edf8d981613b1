use uow_error::Result;

macro_rules! impl_to_value_base {
    ($ty:ty, $enum_field:ident) => {
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::$enum_field(self.clone())
            }
        }
    };
}

macro_rules! impl_from_value_integer {
    ($ty:ty) => {
        impl FromValue for $ty {
            type Output = $ty;

            fn from_value(v: &Value) -> Result<Self::Output> {
                let n = v.as_integer().ok_or_else(|| {
                    uow_error::from_value!(
                        "Invalid value: {:?}, output type: {}",
                        v,
                        stringify!($ty)
                    )
                })?;

                <$ty>::try_from(n).map_err(|_| {
                    uow_error::from_value!("Value {} out of range for {}", n, stringify!($ty))
                })
            }
        }
    };
}

macro_rules! impl_from_value_float {
    ($ty:ty) => {
        impl FromValue for $ty {
            type Output = $ty;

            fn from_value(v: &Value) -> Result<Self::Output> {
                match v {
                    Value::F32(v) => Ok(*v as $ty),
                    Value::F64(v) => Ok(*v as $ty),
                    _ => match v.as_integer() {
                        Some(n) => Ok(n as $ty),
                        None => Err(uow_error::from_value!(
                            "Invalid value: {:?}, output type: {}",
                            v,
                            stringify!($ty)
                        )),
                    },
                }
            }
        }
    };
}

macro_rules! impl_from_value_base {
    ($ty:ty, $enum_field:ident) => {
        impl FromValue for $ty {
            type Output = $ty;

            fn from_value(v: &Value) -> Result<Self::Output> {
                match v {
                    Value::$enum_field(v) => Ok(v.clone()),
                    _ => Err(uow_error::from_value!(
                        "Invalid value: {:?}, output type: {}",
                        v,
                        stringify!($ty)
                    )),
                }
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value, bools included
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(*v as i128),
            Self::U8(v) => Some(*v as i128),
            Self::I8(v) => Some(*v as i128),
            Self::U16(v) => Some(*v as i128),
            Self::I16(v) => Some(*v as i128),
            Self::U32(v) => Some(*v as i128),
            Self::I32(v) => Some(*v as i128),
            Self::U64(v) => Some(*v as i128),
            Self::I64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Compare two values the way the database would: integers of different
    /// width are equal when their numbers are.
    pub fn matches(&self, other: &Value) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(l), Some(r)) => l == r,
            _ => self == other,
        }
    }
}

pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl_to_value_base! {bool, Bool}
impl_to_value_base! {u8, U8}
impl_to_value_base! {i8, I8}
impl_to_value_base! {u16, U16}
impl_to_value_base! {i16, I16}
impl_to_value_base! {u32, U32}
impl_to_value_base! {i32, I32}
impl_to_value_base! {u64, U64}
impl_to_value_base! {i64, I64}
impl_to_value_base! {f32, F32}
impl_to_value_base! {f64, F64}
impl_to_value_base! {String, Str}
impl_to_value_base! {Vec<u8>, Bytes}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        T::to_value(*self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        if let Some(v) = self {
            T::to_value(v)
        } else {
            Value::Null
        }
    }
}

pub trait FromValue {
    type Output;

    fn from_value(v: &Value) -> Result<Self::Output>;
}

impl<T: FromValue> FromValue for Option<T> {
    type Output = Option<<T as FromValue>::Output>;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(v)?)),
        }
    }
}

impl FromValue for bool {
    type Output = bool;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v.as_integer() {
            Some(n) => Ok(n != 0),
            None => Err(uow_error::from_value!(
                "Invalid value: {:?}, output type: {}",
                v,
                stringify!(bool)
            )),
        }
    }
}

impl FromValue for Value {
    type Output = Value;

    fn from_value(v: &Value) -> Result<Self::Output> {
        Ok(v.clone())
    }
}

impl_from_value_integer! {u8}
impl_from_value_integer! {i8}
impl_from_value_integer! {u16}
impl_from_value_integer! {i16}
impl_from_value_integer! {u32}
impl_from_value_integer! {i32}
impl_from_value_integer! {u64}
impl_from_value_integer! {i64}

impl_from_value_float! {f32}
impl_from_value_float! {f64}

impl_from_value_base! {String, Str}
impl_from_value_base! {Vec<u8>, Bytes}
