use indexmap::IndexMap;

use crate::ContainerRuntime;
use crate::NodeHandle;

/// One row of a `| node | seeds |` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRow {
    pub node: String,
    /// Raw comma separated seed column
    pub seeds: String,
}

impl SeedRow {
    pub fn new(
        node: impl Into<String>,
        seeds: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            seeds: seeds.into(),
        }
    }
}

/// Node name to handle, iterated in declaration order
pub struct Topology<R>
where
    R: ContainerRuntime,
{
    nodes: IndexMap<String, NodeHandle<R>>,
}

impl<R> Default for Topology<R>
where
    R: ContainerRuntime,
{
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }
}

impl<R> Topology<R>
where
    R: ContainerRuntime,
{
    /// Insert `handle`, handing back any handle previously declared under the same name
    pub fn insert(
        &mut self,
        handle: NodeHandle<R>,
    ) -> Option<NodeHandle<R>> {
        let name = handle.name().to_string();
        // shift_remove keeps a redeclared node at the end of the declaration order
        let previous = self.nodes.shift_remove(&name);
        self.nodes.insert(name, handle);
        previous
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&NodeHandle<R>> {
        self.nodes.get(name)
    }

    pub fn get_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut NodeHandle<R>> {
        self.nodes.get_mut(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeHandle<R>> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeHandle<R>> {
        self.nodes.values_mut()
    }

    /// Remove every handle, in declaration order
    pub fn drain(&mut self) -> Vec<NodeHandle<R>> {
        self.nodes.drain(..).map(|(_, handle)| handle).collect()
    }
}
