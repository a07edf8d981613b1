//! # Filter
//!
//! The `WHERE .. ORDER BY .. LIMIT ..` tail of a select.
use uow_error::Result;

use crate::Where;

#[derive(Debug, Clone, Default)]
pub struct Filter {
    where_cond: Option<Where>,
    order_bys: Vec<(String, bool)>, // (column, is_asc)
    limit: Option<(u64, u64)>,      // (limit, offset)
}

impl Filter {
    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.where_cond = Some(cond);
        self
    }

    pub fn order_bys<T, S>(&mut self, list: T) -> &mut Self
    where
        T: IntoIterator<Item = (S, bool)>,
        S: ToString,
    {
        self.order_bys = list
            .into_iter()
            .map(|(name, is_asc)| (name.to_string(), is_asc))
            .collect();
        self
    }

    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.limit = Some((limit, offset));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.where_cond.is_none() && self.order_bys.is_empty() && self.limit.is_none()
    }

    pub fn build(&self) -> Result<String> {
        let mut parts = Vec::<String>::new();

        if let Some(whe) = &self.where_cond {
            parts.push(format!("WHERE {}", whe));
        }

        if !self.order_bys.is_empty() {
            let orders = self
                .order_bys
                .iter()
                .map(|(name, is_asc)| format!("{} {}", name, if *is_asc { "ASC" } else { "DESC" }))
                .collect::<Vec<_>>();
            parts.push(format!("ORDER BY {}", orders.join(", ")));
        }

        if let Some((limit, offset)) = self.limit {
            parts.push(format!("LIMIT {} OFFSET {}", limit, offset));
        }

        Ok(parts.join(" "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build() {
        assert!(Filter::default().is_empty());

        let sql = Filter::default()
            .where_cond(Where::raw("a > 1"))
            .order_bys([("a", true), ("b", false)])
            .limit(10, 20)
            .build()
            .unwrap();
        assert_eq!(sql, "WHERE (a > 1) ORDER BY a ASC, b DESC LIMIT 10 OFFSET 20");

        let sql = Filter::default().limit(1, 0).build().unwrap();
        assert_eq!(sql, "LIMIT 1 OFFSET 0");
    }
}
