//! Netgraph integration tests.

#[cfg(test)]
pub mod connectivity;
#[cfg(test)]
pub mod drivers;
#[cfg(test)]
pub mod hierarchy;
#[cfg(test)]
pub mod identity;
#[cfg(test)]
pub mod library;
pub mod shared;
