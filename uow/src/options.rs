/// What the `EntityMapper` does when a column value cannot be assigned to
/// its field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterializePolicy {
    /// Keep the field's default value and log the failure at debug level
    #[default]
    Lenient,
    /// Fail the read
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub materialize: MaterializePolicy,
}

impl SessionOptions {
    pub fn materialize(mut self, policy: MaterializePolicy) -> Self {
        self.materialize = policy;
        self
    }
}
