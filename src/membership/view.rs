use std::collections::BTreeSet;
use std::fmt;

/// One node's answer to a membership query.
///
/// Entries keep the order and duplicates the node reported; comparisons
/// between views are set based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipView {
    members: Vec<String>,
}

impl MembershipView {
    /// Split a newline-delimited response, dropping empty lines
    pub fn parse(response: &str) -> Self {
        let members = response
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { members }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn as_set(&self) -> BTreeSet<&str> {
        self.members.iter().map(String::as_str).collect()
    }

    pub fn contains(
        &self,
        id: &str,
    ) -> bool {
        self.members.iter().any(|member| member == id)
    }

    /// Identities of `expected` the view does not mention
    pub fn missing<'a, I>(
        &self,
        expected: I,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known = self.as_set();
        expected
            .into_iter()
            .filter(|id| !known.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Set equality, ignoring order and duplicates
    pub fn is_exactly<'a, I>(
        &self,
        expected: I,
    ) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let expected: BTreeSet<&str> = expected.into_iter().collect();
        self.as_set() == expected
    }
}

impl From<Vec<String>> for MembershipView {
    fn from(members: Vec<String>) -> Self {
        Self { members }
    }
}

impl fmt::Display for MembershipView {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{}]", self.members.join(", "))
    }
}
