use std::fmt;

use crate::QueryValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Box<Where>, Box<Where>),
    Or(Box<Where>, Box<Where>),
    Not(Box<Where>),
    Eq(Box<Where>, Box<Where>),
    Ne(Box<Where>, Box<Where>),
    Lt(Box<Where>, Box<Where>),
    Le(Box<Where>, Box<Where>),
    Gt(Box<Where>, Box<Where>),
    Ge(Box<Where>, Box<Where>),
    Between(Box<Where>, Box<Where>, Box<Where>),
    In(Box<Where>, Vec<Where>),
    Like(Box<Where>, Box<Where>),
    IsNull(Box<Where>),
    Value(QueryValue),
    /// Caller supplied condition text, wrapped in parentheses
    Raw(String),
}

impl Where {
    pub fn raw<S: ToString>(text: S) -> Self {
        Self::Raw(text.to_string())
    }
}

impl<T: Into<QueryValue>> From<T> for Where {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(l, r) => write!(f, "({} AND {})", l, r),
            Self::Or(l, r) => write!(f, "({} OR {})", l, r),
            Self::Not(v) => write!(f, "(NOT {})", v),
            Self::Eq(l, r) => write!(f, "({} = {})", l, r),
            Self::Ne(l, r) => write!(f, "({} <> {})", l, r),
            Self::Lt(l, r) => write!(f, "({} < {})", l, r),
            Self::Le(l, r) => write!(f, "({} <= {})", l, r),
            Self::Gt(l, r) => write!(f, "({} > {})", l, r),
            Self::Ge(l, r) => write!(f, "({} >= {})", l, r),
            Self::Between(var, l, r) => write!(f, "({} BETWEEN {} AND {})", var, l, r),
            Self::In(var, list) => write!(
                f,
                "({} IN ({}))",
                var,
                list.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Self::Like(var, lik) => write!(f, "({} LIKE {})", var, lik),
            Self::IsNull(v) => write!(f, "({} IS NULL)", v),
            Self::Value(v) => write!(f, "{}", v),
            Self::Raw(text) => write!(f, "({})", text),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bin(op: fn(Box<Where>, Box<Where>) -> Where, l: &str, r: &str) -> Where {
        op(Box::new(l.into()), Box::new(r.into()))
    }

    #[test]
    fn test_render() {
        let name = bin(Where::Eq, "name", "?");
        assert_eq!(name.to_string(), "(name = ?)");

        let age = Where::Or(
            Box::new(bin(Where::Gt, "age", "?")),
            Box::new(Where::IsNull(Box::new("age".into()))),
        );
        assert_eq!(
            Where::And(Box::new(name), Box::new(age)).to_string(),
            "((name = ?) AND ((age > ?) OR (age IS NULL)))"
        );

        assert_eq!(
            Where::Not(Box::new(Where::Between(
                Box::new("a".into()),
                Box::new(1.into()),
                Box::new(2.into()),
            )))
            .to_string(),
            "(NOT (a BETWEEN 1 AND 2))"
        );
        assert_eq!(
            Where::In(Box::new("id".into()), vec!["?".into(), "?".into()]).to_string(),
            "(id IN (?, ?))"
        );
        assert_eq!(bin(Where::Like, "a", "?").to_string(), "(a LIKE ?)");
        assert_eq!(bin(Where::Ne, "a", "b").to_string(), "(a <> b)");
        assert_eq!(
            Where::Eq(Box::new("a".into()), Box::new(QueryValue::Null.into())).to_string(),
            "(a = NULL)"
        );
    }

    #[test]
    fn test_raw() {
        assert_eq!(
            Where::And(
                Box::new(Where::raw("age > 3 OR age < 1")),
                Box::new(bin(Where::Le, "score", "?")),
            )
            .to_string(),
            "((age > 3 OR age < 1) AND (score <= ?))"
        );
    }
}
