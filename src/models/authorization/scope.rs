//! Scope enum for authorization

/// All - every row of the resource, Owned - rows belonging to the requester
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    All,
    Owned,
}
