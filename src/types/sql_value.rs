/// A typed application value queued for placeholder substitution.
/// Dialects turn these into SQL literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Escapes to a parenthesized, comma separated list.
    List(Vec<SqlValue>),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

macro_rules! signed_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                SqlValue::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! unsigned_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                SqlValue::UInt(u64::from(value))
            }
        })*
    };
}

signed_into_value!(i8, i16, i32, i64);
unsigned_into_value!(u8, u16, u32, u64);

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        SqlValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Conversion into an ordered list of bind values.
///
/// A single scalar becomes a one-element list, `()` means "no binds",
/// and sequences contribute one bind per element.
pub trait IntoBinds {
    fn into_binds(self) -> Vec<SqlValue>;
}

impl IntoBinds for () {
    fn into_binds(self) -> Vec<SqlValue> {
        Vec::new()
    }
}

macro_rules! scalar_binds {
    ($($t:ty),*) => {
        $(impl IntoBinds for $t {
            fn into_binds(self) -> Vec<SqlValue> {
                vec![SqlValue::from(self)]
            }
        })*
    };
}

scalar_binds!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, &String);

impl IntoBinds for &str {
    fn into_binds(self) -> Vec<SqlValue> {
        vec![SqlValue::from(self)]
    }
}

impl IntoBinds for SqlValue {
    fn into_binds(self) -> Vec<SqlValue> {
        vec![self]
    }
}

impl<T: Into<SqlValue>> IntoBinds for Option<T> {
    fn into_binds(self) -> Vec<SqlValue> {
        vec![SqlValue::from(self)]
    }
}

impl<T: Into<SqlValue>> IntoBinds for Vec<T> {
    fn into_binds(self) -> Vec<SqlValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<SqlValue>, const N: usize> IntoBinds for [T; N] {
    fn into_binds(self) -> Vec<SqlValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<SqlValue> + Clone> IntoBinds for &[T] {
    fn into_binds(self) -> Vec<SqlValue> {
        self.iter().cloned().map(Into::into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(SqlValue::from(42_i32), SqlValue::Int(42));
        assert_eq!(SqlValue::from(7_u32), SqlValue::UInt(7));
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(true)), SqlValue::Bool(true));
    }

    #[test]
    fn test_vec_becomes_list_value() {
        assert_eq!(
            SqlValue::from(vec![1_i64, 2]),
            SqlValue::List(vec![SqlValue::Int(1), SqlValue::Int(2)])
        );
    }

    #[test]
    fn test_into_binds() {
        assert!(().into_binds().is_empty());
        assert_eq!(5_i32.into_binds(), vec![SqlValue::Int(5)]);
        assert_eq!(
            [1_i64, 2, 3].into_binds(),
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
        assert_eq!(
            vec!["a", "b"].into_binds(),
            vec![SqlValue::from("a"), SqlValue::from("b")]
        );
    }
}
