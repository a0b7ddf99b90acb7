use std::collections::HashMap;

use super::error::RegistryError as Error;
use super::types::{Node, NodeId, OutputContext, REMOVED_VOLUME};

/// Live nodes keyed by identity. Every volume transition goes through here
/// and lands in the node's log before the node can disappear.
#[derive(Debug)]
pub struct Registry {
    nodes: HashMap<NodeId, Node>,
    // Insertion order, newest last.
    order: Vec<NodeId>,
    clock: fn() -> i64,
}

fn wall_clock() -> i64 {
    jiff::Timestamp::now().as_second()
}

impl Registry {
    pub fn new() -> Self {
        Self::with_clock(wall_clock)
    }

    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self { nodes: HashMap::new(), order: Vec::new(), clock }
    }

    /// Returns the node for `id`, building it with `factory` only when absent.
    pub fn upsert<F>(&mut self, id: &NodeId, factory: F) -> Result<&mut Node, Error>
    where
        F: FnOnce() -> Result<Node, Error>,
    {
        if !self.nodes.contains_key(id) {
            let node = factory()?;
            tracing::info!("Tracking node {} -> {}", id, node.log_sink().path().display());
            self.order.push(id.clone());
            self.nodes.insert(id.clone(), node);
        }
        self.nodes.get_mut(id).ok_or_else(|| Error::LookupMiss(id.clone()))
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Sets the node's volume and appends exactly one record.
    pub fn update_volume(&mut self, id: &NodeId, volume: f64, ctx: &OutputContext) -> Result<(), Error> {
        let now = (self.clock)();
        let node = self.nodes.get_mut(id).ok_or_else(|| Error::LookupMiss(id.clone()))?;
        node.volume = volume;
        let record = node.record(now, ctx);
        tracing::debug!("{} <- {}", id, record);
        node.sink.append(&record)
    }

    pub fn remove(&mut self, id: &NodeId, ctx: &OutputContext) -> Result<(), Error> {
        let mut node = self.nodes.remove(id).ok_or_else(|| Error::LookupMiss(id.clone()))?;
        self.order.retain(|other| other != id);

        node.volume = REMOVED_VOLUME;
        let record = node.record((self.clock)(), ctx);
        node.sink.append(&record)?;
        node.sink.close()?;
        tracing::info!("Closed log for node {}", id);
        Ok(())
    }

    /// Appends the current state of every node, newest first.
    pub fn log_all(&mut self, ctx: &OutputContext) -> Result<(), Error> {
        self.log_where(ctx, |_| true)
    }

    pub fn log_all_except(&mut self, skip: &NodeId, ctx: &OutputContext) -> Result<(), Error> {
        self.log_where(ctx, |id| id != skip)
    }

    fn log_where(&mut self, ctx: &OutputContext, keep: impl Fn(&NodeId) -> bool) -> Result<(), Error> {
        let now = (self.clock)();
        for id in self.order.iter().rev().filter(|&id| keep(id)) {
            if let Some(node) = self.nodes.get_mut(id) {
                let record = node.record(now, ctx);
                node.sink.append(&record)?;
            }
        }
        Ok(())
    }

    /// Removes every node. All logs get their final record and are closed,
    /// even if one of them fails; the first failure is returned.
    pub fn drain(&mut self, ctx: &OutputContext) -> Result<(), Error> {
        let mut first_error = None;
        let ids: Vec<NodeId> = self.order.iter().rev().cloned().collect();
        for id in ids {
            if let Err(e) = self.remove(&id, ctx) {
                tracing::error!("Failed to finalize node {}: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.order.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
