use crate::Error;
use crate::Result;

/// Hands out host ports for query endpoints.
///
/// Allocation is strictly increasing for the allocator's whole lifetime, so
/// two nodes never share an endpoint even after one of them was removed.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    next: Option<u16>,
}

impl PortAllocator {
    pub fn new(first: u16) -> Self {
        Self { next: Some(first) }
    }

    /// Take the next unused port
    pub fn allocate(&mut self) -> Result<u16> {
        let port = self.next.ok_or(Error::PortsExhausted(u16::MAX))?;
        self.next = port.checked_add(1);
        Ok(port)
    }

    /// Port the next call to [`allocate`](Self::allocate) would return
    pub fn peek(&self) -> Option<u16> {
        self.next
    }
}
