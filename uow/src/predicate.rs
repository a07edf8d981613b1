use crate::{
    query::{QueryValue, Where},
    ToValue, Value,
};

/// Composable filter: a `Where` tree with `?` placeholders plus the bind
/// values in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    cond: Option<Where>,
    params: Vec<Value>,
}

impl Predicate {
    /// Matches every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Caller written condition text, `?` placeholders bound from `params`
    pub fn raw<S: ToString>(cond: S, params: Vec<Value>) -> Self {
        let text = cond.to_string();
        if text.trim().is_empty() {
            return Self::all();
        }

        Self {
            cond: Some(Where::raw(text.trim())),
            params,
        }
    }

    /// Matches no row
    pub fn none() -> Self {
        Self {
            cond: Some(Where::raw("1 = 0")),
            params: vec![],
        }
    }

    pub fn eq<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Eq)
    }

    pub fn ne<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Ne)
    }

    pub fn lt<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Lt)
    }

    pub fn le<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Le)
    }

    pub fn gt<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Gt)
    }

    pub fn ge<S: ToString, V: ToValue>(col: S, value: V) -> Self {
        Self::binary(col, value, Where::Ge)
    }

    pub fn like<S: ToString, V: ToValue>(col: S, pattern: V) -> Self {
        Self::binary(col, pattern, Where::Like)
    }

    pub fn between<S: ToString, V: ToValue>(col: S, low: V, high: V) -> Self {
        Self {
            cond: Some(Where::Between(
                Box::new(column(col)),
                Box::new(placeholder()),
                Box::new(placeholder()),
            )),
            params: vec![low.to_value(), high.to_value()],
        }
    }

    /// An empty list matches no row
    pub fn in_list<S, I, V>(col: S, values: I) -> Self
    where
        S: ToString,
        I: IntoIterator<Item = V>,
        V: ToValue,
    {
        let params = values
            .into_iter()
            .map(|v| v.to_value())
            .collect::<Vec<_>>();
        if params.is_empty() {
            return Self::none();
        }

        Self {
            cond: Some(Where::In(
                Box::new(column(col)),
                params.iter().map(|_| placeholder()).collect(),
            )),
            params,
        }
    }

    pub fn is_null<S: ToString>(col: S) -> Self {
        Self {
            cond: Some(Where::IsNull(Box::new(column(col)))),
            params: vec![],
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self.cond, other.cond) {
            (None, cond) => Self {
                cond,
                params: other.params,
            },
            (cond, None) => Self {
                cond,
                params: self.params,
            },
            (Some(l), Some(r)) => {
                let mut params = self.params;
                params.extend(other.params);
                Self {
                    cond: Some(Where::And(Box::new(l), Box::new(r))),
                    params,
                }
            }
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match (self.cond, other.cond) {
            (Some(l), Some(r)) => {
                let mut params = self.params;
                params.extend(other.params);
                Self {
                    cond: Some(Where::Or(Box::new(l), Box::new(r))),
                    params,
                }
            }
            // Either side matches everything
            _ => Self::all(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self.cond {
            Some(cond) => Self {
                cond: Some(Where::Not(Box::new(cond))),
                params: self.params,
            },
            None => Self::none(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.cond.is_none()
    }

    pub fn where_cond(&self) -> Option<&Where> {
        self.cond.as_ref()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn binary<S, V, F>(col: S, value: V, op: F) -> Self
    where
        S: ToString,
        V: ToValue,
        F: FnOnce(Box<Where>, Box<Where>) -> Where,
    {
        Self {
            cond: Some(op(Box::new(column(col)), Box::new(placeholder()))),
            params: vec![value.to_value()],
        }
    }
}

fn column<S: ToString>(col: S) -> Where {
    Where::Value(QueryValue::Column(col.to_string()))
}

fn placeholder() -> Where {
    Where::Value(QueryValue::Column("?".into()))
}
