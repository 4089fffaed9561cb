//! Graph handle: one named graph on one connection

use super::event::{GraphEvent, GraphListener};
use crate::config::{GraphConfig, QueryOptions, ResourceSettings, DEFAULT_GRAPH};
use crate::connection::{Connection, StatementOptions};
use crate::error::{BridgeError, BridgeResult};
use tracing::{debug, warn};

/// Session-scoped reference to one graph of the remote store.
///
/// Owns the connection; [`close`](Self::close) (or drop) releases it and
/// every later operation fails with [`BridgeError::Closed`].
pub struct GraphHandle {
    graph_name: String,
    connection: Option<Box<dyn Connection>>,
    options: QueryOptions,
    resources: ResourceSettings,
    listeners: Vec<Box<dyn GraphListener>>,
}

impl GraphHandle {
    /// Handle on the store's default graph
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self::with_graph(connection, DEFAULT_GRAPH)
    }

    pub fn with_graph(connection: Box<dyn Connection>, graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            connection: Some(connection),
            options: QueryOptions::default(),
            resources: ResourceSettings::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_config(connection: Box<dyn Connection>, config: &GraphConfig) -> Self {
        let mut handle = Self::with_graph(connection, config.graph_name.clone());
        handle.options = config.options.clone();
        handle.resources = config.resources;
        handle
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    pub fn is_default_graph(&self) -> bool {
        self.graph_name == DEFAULT_GRAPH
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn resources(&self) -> &ResourceSettings {
        &self.resources
    }

    pub fn rule_set(&self) -> Option<&str> {
        self.options.rule_set.as_deref()
    }

    pub fn set_rule_set(&mut self, rule_set: Option<String>) {
        self.options.rule_set = rule_set;
    }

    pub fn same_as(&self) -> bool {
        self.options.same_as
    }

    pub fn set_same_as(&mut self, same_as: bool) {
        self.options.same_as = same_as;
    }

    pub fn read_all_graphs(&self) -> bool {
        self.options.read_all_graphs
    }

    pub fn set_read_all_graphs(&mut self, read_all: bool) {
        self.options.read_all_graphs = read_all;
    }

    pub fn fetch_size(&self) -> u32 {
        self.resources.fetch_size
    }

    pub fn set_fetch_size(&mut self, fetch_size: u32) {
        self.resources.fetch_size = fetch_size;
    }

    pub fn query_timeout_secs(&self) -> u64 {
        self.resources.query_timeout_secs
    }

    /// 0 disables the timeout
    pub fn set_query_timeout_secs(&mut self, secs: u64) {
        self.resources.query_timeout_secs = secs;
    }

    /// Fetch size and timeout for the next statement
    pub fn statement_options(&self) -> StatementOptions {
        StatementOptions {
            fetch_size: self.resources.fetch_size,
            query_timeout: self.resources.query_timeout(),
        }
    }

    pub fn connection(&self) -> BridgeResult<&dyn Connection> {
        self.connection.as_deref().ok_or(BridgeError::Closed)
    }

    pub fn connection_mut(&mut self) -> BridgeResult<&mut dyn Connection> {
        match self.connection.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(BridgeError::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Release the connection; a second call does nothing
    pub fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            if let Err(e) = conn.close() {
                warn!("Closing connection for <{}> failed: {}", self.graph_name, e);
            }
            debug!("Graph handle for <{}> closed", self.graph_name);
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn notify(&mut self, event: GraphEvent) {
        for listener in &mut self.listeners {
            listener.notify(&event);
        }
    }
}

impl Drop for GraphHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHandle")
            .field("graph_name", &self.graph_name)
            .field("options", &self.options)
            .field("resources", &self.resources)
            .field("closed", &self.is_closed())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
