//! Shared design and library fixtures.

pub mod designs;
pub mod liberty;

use netgraph::{Instance, Network, NetworkConfig};
use physdb::Database;

/// Loads `db` into a new network, with the standard timing library loaded first.
pub fn load(db: Database, config: NetworkConfig) -> Network {
    let mut network = Network::new(config);
    network.read_liberty(liberty::stdcells());
    network.read_db(db);
    network
}

/// Every instance reachable from the top instance, the top instance first.
pub fn all_instances(network: &Network) -> Vec<Instance> {
    let mut instances = Vec::new();
    let mut stack = vec![Instance::Top];
    while let Some(instance) = stack.pop() {
        instances.push(instance);
        stack.extend(network.child_iter(instance));
    }
    instances
}
