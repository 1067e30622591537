use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, OnceLock};

use crate::error::{NetError, Result};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;

/// Handle to a network held by a [`NetworkRegistry`].
///
/// The generation makes handles single-use: once a network is removed its
/// slot may be reused, but the old handle will never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkHandle {
    index: usize,
    generation: u64,
}

impl NetworkHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u64,
    network: Option<Network>,
}

/// Owns every live network, addressed by [`NetworkHandle`].
#[derive(Default)]
pub struct NetworkRegistry {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        NetworkRegistry::default()
    }

    /// Builds a network from `spec`, joins it and registers it.
    pub fn create(&mut self, spec: &NetworkSpec) -> Result<NetworkHandle> {
        let network = Network::from_spec(spec)?;
        Ok(self.insert(network))
    }

    pub fn insert(&mut self, network: Network) -> NetworkHandle {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.network = Some(network);
                NetworkHandle { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, network: Some(network) });
                NetworkHandle { index: self.slots.len() - 1, generation: 0 }
            }
        }
    }

    pub fn get(&self, handle: NetworkHandle) -> Result<&Network> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.network.as_ref())
            .ok_or(NetError::NotFound(handle))
    }

    pub fn get_mut(&mut self, handle: NetworkHandle) -> Result<&mut Network> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.network.as_mut())
            .ok_or(NetError::NotFound(handle))
    }

    /// Takes the network out of the registry. Its layers go with it.
    pub fn remove(&mut self, handle: NetworkHandle) -> Result<Network> {
        let slot = self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation && slot.network.is_some())
            .ok_or(NetError::NotFound(handle))?;

        let network = slot.network.take().ok_or(NetError::NotFound(handle))?;
        slot.generation += 1;
        self.free.push(handle.index);
        Ok(network)
    }

    /// Drops every network. Handles issued so far stay invalid.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.network.take().is_some() {
                slot.generation += 1;
                self.free.push(index);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.network.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of every live network, in slot order.
    pub fn handles(&self) -> Vec<NetworkHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.network.is_some())
            .map(|(index, slot)| NetworkHandle { index, generation: slot.generation })
            .collect()
    }
}

/// The process-wide registry.
///
/// Holding the lock serialises every call on every network it owns; callers
/// that want per-network concurrency should keep their own registries.
pub fn global() -> &'static Mutex<NetworkRegistry> {
    static REGISTRY: OnceLock<Mutex<NetworkRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(NetworkRegistry::new()))
}
