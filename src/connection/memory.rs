//! In-process connection backed by [`RdfStore`]
//!
//! Understands the statement shapes the bridge itself produces: the batched
//! insert/delete templates, graph clear, count/exists/enumerate selects and
//! delete-where. Anything else is recorded and answered from a queue of
//! scripted result sets. Writes made while autocommit is off go to a working
//! copy that `commit` publishes and `rollback` discards.
//!
//! A [`MemoryProbe`] shares the connection's state so tests can inspect the
//! store, the statement log and batch sizes after the connection has been
//! handed to a graph handle.

use super::{
    Connection, ConnectionError, ConnectionResult, Isolation, NativeValue, Param, PreparedStatement,
    RowStream, StatementOptions,
};
use crate::codec::{decode_node, decode_object_slots, ExtendedString, RdfBox, BLANK_PREFIX};
use crate::mutation::{CLEAR_GRAPH_TEMPLATE, DELETE_TEMPLATE, INSERT_TEMPLATE};
use crate::rdf::{Literal, NamedNode, RdfStore, RdfTerm, Triple, TriplePattern};
use crate::sparql::{COUNT_PREFIX, COUNT_SUFFIX, GRAPH_PARAM, STATEMENT_PREFIX};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

/// One statement as the connection saw it
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub options: StatementOptions,
    /// Parameters of the last execution (empty for plain statements)
    pub params: Vec<Param>,
}

/// Failures to inject
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the n-th (1-based) `execute_batch` call
    pub batch_at: Option<usize>,
    pub commit: bool,
    pub rollback: bool,
    pub set_auto_commit: bool,
    /// Fail every row-returning statement
    pub queries: bool,
    /// Fail every single (non-batch) update execution
    pub updates: bool,
    /// Fail every row stream `close`, after the stream is released
    pub close_stream: bool,
}

#[derive(Debug, Clone)]
struct ScriptedResult {
    columns: Vec<String>,
    rows: Vec<Vec<NativeValue>>,
}

#[derive(Debug)]
struct MemoryState {
    committed: RdfStore,
    working: Option<RdfStore>,
    auto_commit: bool,
    isolation: Isolation,
    supports_transactions: bool,
    closed: bool,
    faults: Faults,
    scripted: VecDeque<ScriptedResult>,
    log: Vec<ExecutedStatement>,
    batch_sizes: Vec<usize>,
    batch_calls: usize,
    commits: usize,
    rollbacks: usize,
    cancels: usize,
    open_streams: usize,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            committed: RdfStore::new(),
            working: None,
            auto_commit: true,
            isolation: Isolation::RepeatableRead,
            supports_transactions: true,
            closed: false,
            faults: Faults::default(),
            scripted: VecDeque::new(),
            log: Vec::new(),
            batch_sizes: Vec::new(),
            batch_calls: 0,
            commits: 0,
            rollbacks: 0,
            cancels: 0,
            open_streams: 0,
        }
    }

    fn store(&self) -> &RdfStore {
        self.working.as_ref().unwrap_or(&self.committed)
    }

    fn store_mut(&mut self) -> &mut RdfStore {
        match self.working {
            Some(ref mut working) => working,
            None => &mut self.committed,
        }
    }

    fn check_open(&self) -> ConnectionResult<()> {
        if self.closed {
            Err(ConnectionError::Closed)
        } else {
            Ok(())
        }
    }

    fn record(&mut self, sql: &str, options: &StatementOptions, params: &[Param]) {
        debug!("memory connection: {}", sql);
        self.log.push(ExecutedStatement {
            sql: sql.to_string(),
            options: *options,
            params: params.to_vec(),
        });
    }
}

type SharedState = Rc<RefCell<MemoryState>>;

/// In-process [`Connection`]
#[derive(Debug)]
pub struct MemoryConnection {
    state: SharedState,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState::new())),
        }
    }

    /// Handle for inspecting this connection's state from outside
    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            state: Rc::clone(&self.state),
        }
    }

    /// Report no transaction support
    pub fn without_transactions(self) -> Self {
        self.state.borrow_mut().supports_transactions = false;
        self
    }

    pub fn with_faults(self, faults: Faults) -> Self {
        self.state.borrow_mut().faults = faults;
        self
    }

    /// Queue a result set for the next statement the connection does not interpret itself
    pub fn push_result(&self, columns: &[&str], rows: Vec<Vec<NativeValue>>) {
        push_scripted(&self.state, columns, rows);
    }
}

fn push_scripted(state: &SharedState, columns: &[&str], rows: Vec<Vec<NativeValue>>) {
    state.borrow_mut().scripted.push_back(ScriptedResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    });
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared view into a [`MemoryConnection`]
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    state: SharedState,
}

impl MemoryProbe {
    /// Same as [`MemoryConnection::push_result`], usable once the connection is handed off
    pub fn push_result(&self, columns: &[&str], rows: Vec<Vec<NativeValue>>) {
        push_scripted(&self.state, columns, rows);
    }

    /// Insert committed triples directly, bypassing the statement path
    pub fn seed(&self, graph: &str, triples: impl IntoIterator<Item = Triple>) {
        let mut state = self.state.borrow_mut();
        for triple in triples {
            state.committed.insert(graph, triple);
        }
    }

    /// Triples visible to the connection (including uncommitted work)
    pub fn graph_len(&self, graph: &str) -> usize {
        self.state.borrow().store().graph_len(graph)
    }

    /// Triples visible to other sessions
    pub fn committed_len(&self, graph: &str) -> usize {
        self.state.borrow().committed.graph_len(graph)
    }

    pub fn contains(&self, graph: &str, triple: &Triple) -> bool {
        self.state.borrow().store().contains(graph, triple)
    }

    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.state.borrow().log.clone()
    }

    pub fn last_statement(&self) -> Option<ExecutedStatement> {
        self.state.borrow().log.last().cloned()
    }

    /// Entry counts of every successful `execute_batch`, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.borrow().batch_sizes.clone()
    }

    pub fn auto_commit(&self) -> bool {
        self.state.borrow().auto_commit
    }

    pub fn isolation(&self) -> Isolation {
        self.state.borrow().isolation
    }

    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }

    pub fn cancels(&self) -> usize {
        self.state.borrow().cancels
    }

    /// Row streams handed out and not yet closed
    pub fn open_streams(&self) -> usize {
        self.state.borrow().open_streams
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.borrow_mut().faults = faults;
    }
}

// ---------------------------------------------------------------------------
// Statement interpretation

#[derive(Debug)]
enum Shape {
    Insert,
    Delete,
    Clear,
    Count { graph: Option<String>, pattern: TriplePattern },
    Select { graph: Option<String>, pattern: TriplePattern, limit: Option<usize> },
    DeleteWhere { graph: String, pattern: TriplePattern },
    Other,
}

fn param_str(params: &[Param], index: usize) -> ConnectionResult<&str> {
    params
        .get(index)
        .and_then(Param::as_str)
        .ok_or_else(|| ConnectionError::Bind(format!("parameter {} is not bound to a string", index + 1)))
}

fn parse_slot(input: &str) -> Option<(Option<RdfTerm>, &str)> {
    let s = input.trim_start();
    if let Some(rest) = s.strip_prefix('?') {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        return Some((None, &rest[end..]));
    }
    if let Some(rest) = s.strip_prefix('<') {
        let end = rest.find('>')?;
        let term = decode_node(&rest[..end]).ok()?;
        return Some((Some(term), &rest[end + 1..]));
    }
    let rest = s.strip_prefix('\'')?;
    let mut value = String::new();
    let mut chars = rest.char_indices().peekable();
    let mut close = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '\''))) => {
                chars.next();
                value.push('\'');
            }
            '\'' => {
                close = Some(i + 1);
                break;
            }
            _ => value.push(c),
        }
    }
    let mut rest = &rest[close?..];
    let term: RdfTerm = if let Some(tail) = rest.strip_prefix('@') {
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let lang = &tail[..end];
        rest = &tail[end..];
        Literal::new_language_tagged_literal(value, lang).ok()?.into()
    } else if let Some(tail) = rest.strip_prefix("^^<") {
        let end = tail.find('>')?;
        let datatype = NamedNode::new(&tail[..end]).ok()?;
        rest = &tail[end + 1..];
        Literal::new_typed_literal(value, datatype).into()
    } else {
        Literal::new_simple_literal(value).into()
    };
    Some((Some(term), rest))
}

fn parse_pattern(text: &str) -> Option<TriplePattern> {
    let (subject, rest) = parse_slot(text)?;
    let (predicate, rest) = parse_slot(rest)?;
    let (object, _) = parse_slot(rest)?;
    Some(TriplePattern::new(subject, predicate, object))
}

fn take_iri(text: &str) -> Option<(&str, &str)> {
    let end = text.find('>')?;
    Some((&text[..end], &text[end + 1..]))
}

fn interpret(sql: &str, params: &[Param]) -> ConnectionResult<Shape> {
    match sql {
        INSERT_TEMPLATE => return Ok(Shape::Insert),
        DELETE_TEMPLATE => return Ok(Shape::Delete),
        CLEAR_GRAPH_TEMPLATE => return Ok(Shape::Clear),
        _ => {}
    }

    let (counting, inner) = match sql.strip_prefix(COUNT_PREFIX).and_then(|s| s.strip_suffix(COUNT_SUFFIX)) {
        Some(inner) => (true, inner),
        None => (false, sql),
    };
    let Some(inner) = inner.strip_prefix(STATEMENT_PREFIX) else {
        return Ok(Shape::Other);
    };
    let body = inner
        .lines()
        .filter(|line| !line.trim_start().starts_with("define "))
        .collect::<Vec<_>>()
        .join(" ");
    let body = body.trim();

    if let Some(rest) = body.strip_prefix("delete from graph <") {
        let Some((graph, _)) = take_iri(rest) else {
            return Ok(Shape::Other);
        };
        let pattern = rest
            .find("where {")
            .and_then(|at| parse_pattern(&rest[at + "where {".len()..]));
        return Ok(match pattern {
            Some(pattern) => Shape::DeleteWhere { graph: graph.to_string(), pattern },
            None => Shape::Other,
        });
    }

    let limit = body.ends_with("limit 1").then_some(1);
    let scoped = if let Some(rest) = body.strip_prefix(&format!("select * where {{ {} {{", GRAPH_PARAM)) {
        Some((Some(param_str(params, 0)?.to_string()), rest))
    } else if let Some(rest) = body.strip_prefix("select * where { graph <") {
        take_iri(rest).and_then(|(g, rest)| rest.trim_start().strip_prefix('{').map(|r| (Some(g.to_string()), r)))
    } else if let Some(rest) = body.strip_prefix("select * from <") {
        take_iri(rest).and_then(|(g, rest)| rest.trim_start().strip_prefix("where {").map(|r| (Some(g.to_string()), r)))
    } else {
        body.strip_prefix("select * where {").map(|rest| (None, rest))
    };

    let Some((graph, rest)) = scoped else {
        return Ok(Shape::Other);
    };
    let Some(pattern) = parse_pattern(rest) else {
        return Ok(Shape::Other);
    };
    Ok(if counting {
        Shape::Count { graph, pattern }
    } else {
        Shape::Select { graph, pattern, limit }
    })
}

fn term_to_native(term: &RdfTerm) -> NativeValue {
    match term {
        RdfTerm::NamedNode(n) => NativeValue::Extended(ExtendedString::iri(n.as_str())),
        RdfTerm::BlankNode(b) => NativeValue::Extended(ExtendedString::iri(format!("{}{}", BLANK_PREFIX, b.as_str()))),
        RdfTerm::Literal(lit) => {
            let mut rb = RdfBox::new(lit.value());
            if let Some(lang) = lit.language() {
                rb = rb.with_lang(lang);
            } else if let Some(datatype) = lit.explicit_datatype() {
                rb = rb.with_datatype(datatype.as_str());
            }
            NativeValue::Box(rb)
        }
    }
}

fn decode_triple(params: &[Param]) -> ConnectionResult<(String, Triple)> {
    if params.len() != 6 {
        return Err(ConnectionError::Bind(format!("expected 6 parameters, got {}", params.len())));
    }
    let bad = |e: crate::rdf::RdfError| ConnectionError::Bind(e.to_string());
    let graph = param_str(params, 0)?.to_string();
    let subject = decode_node(param_str(params, 1)?).map_err(bad)?;
    let predicate = decode_node(param_str(params, 2)?).map_err(bad)?;
    let code = params[3]
        .as_int()
        .ok_or_else(|| ConnectionError::Bind("parameter 4 is not an integer".to_string()))?;
    let object = decode_object_slots(code, param_str(params, 4)?, params[5].as_str()).map_err(bad)?;
    Ok((graph, Triple::new(subject, predicate, object)))
}

/// Run one statement against the state; rows for selects, `None` for updates
fn run(
    state: &mut MemoryState,
    sql: &str,
    params: &[Param],
    want_rows: bool,
) -> ConnectionResult<Option<ScriptedResult>> {
    if want_rows && state.faults.queries {
        return Err(ConnectionError::Statement(format!("query rejected: {}", sql)));
    }
    let result = match interpret(sql, params)? {
        Shape::Insert => {
            let (graph, triple) = decode_triple(params)?;
            state.store_mut().insert(&graph, triple);
            None
        }
        Shape::Delete => {
            let (graph, triple) = decode_triple(params)?;
            state.store_mut().remove(&graph, &triple);
            None
        }
        Shape::Clear => {
            let graph = param_str(params, 0)?.to_string();
            state.store_mut().clear_graph(&graph);
            None
        }
        Shape::DeleteWhere { graph, pattern } => {
            state.store_mut().remove_matching(&graph, &pattern);
            None
        }
        Shape::Count { graph, pattern } => {
            let count = state.store().query(graph.as_deref(), &pattern).len() as i64;
            Some(ScriptedResult {
                columns: vec!["count".to_string()],
                rows: vec![vec![NativeValue::Integer(count)]],
            })
        }
        Shape::Select { graph, pattern, limit } => {
            let mut columns = Vec::new();
            for (name, slot) in [("s", &pattern.subject), ("p", &pattern.predicate), ("o", &pattern.object)] {
                if slot.is_none() {
                    columns.push(name.to_string());
                }
            }
            let hits = state.store().query(graph.as_deref(), &pattern);
            let rows = hits
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .map(|(_, t)| {
                    let mut row = Vec::new();
                    for (slot, term) in [
                        (&pattern.subject, &t.subject),
                        (&pattern.predicate, &t.predicate),
                        (&pattern.object, &t.object),
                    ] {
                        if slot.is_none() {
                            row.push(term_to_native(term));
                        }
                    }
                    row
                })
                .collect();
            Some(ScriptedResult { columns, rows })
        }
        Shape::Other => {
            if want_rows {
                Some(state.scripted.pop_front().unwrap_or(ScriptedResult {
                    columns: Vec::new(),
                    rows: Vec::new(),
                }))
            } else {
                None
            }
        }
    };
    Ok(result)
}

struct MemoryRows {
    state: SharedState,
    columns: Vec<String>,
    rows: VecDeque<Vec<NativeValue>>,
    open: bool,
}

impl MemoryRows {
    fn open(state: &SharedState, result: ScriptedResult) -> Self {
        state.borrow_mut().open_streams += 1;
        Self {
            state: Rc::clone(state),
            columns: result.columns,
            rows: result.rows.into(),
            open: true,
        }
    }
}

impl RowStream for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> ConnectionResult<Option<Vec<NativeValue>>> {
        if !self.open {
            return Err(ConnectionError::Closed);
        }
        Ok(self.rows.pop_front())
    }

    fn cancel(&mut self) -> ConnectionResult<()> {
        self.state.borrow_mut().cancels += 1;
        self.rows.clear();
        Ok(())
    }

    fn close(&mut self) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        if self.open {
            self.open = false;
            state.open_streams -= 1;
        }
        if state.faults.close_stream {
            return Err(ConnectionError::Statement("stream close refused by store".to_string()));
        }
        Ok(())
    }
}

impl Drop for MemoryRows {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

struct MemoryStatement {
    state: SharedState,
    sql: String,
    options: StatementOptions,
    params: Vec<Param>,
    batch: Vec<Vec<Param>>,
}

impl PreparedStatement for MemoryStatement {
    fn bind(&mut self, index: usize, value: Param) -> ConnectionResult<()> {
        if index == 0 {
            return Err(ConnectionError::Bind("parameter indexes start at 1".to_string()));
        }
        if self.params.len() < index {
            self.params.resize(index, Param::Null);
        }
        self.params[index - 1] = value;
        Ok(())
    }

    fn add_batch(&mut self) -> ConnectionResult<()> {
        self.batch.push(self.params.clone());
        Ok(())
    }

    fn execute_batch(&mut self) -> ConnectionResult<usize> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        state.batch_calls += 1;
        if state.faults.batch_at == Some(state.batch_calls) {
            return Err(ConnectionError::Statement(format!(
                "batch {} rejected by store",
                state.batch_calls
            )));
        }
        for params in &self.batch {
            run(&mut state, &self.sql, params, false)?;
        }
        let size = self.batch.len();
        let last = self.batch.last().cloned().unwrap_or_default();
        state.record(&self.sql, &self.options, &last);
        state.batch_sizes.push(size);
        Ok(size)
    }

    fn clear_batch(&mut self) {
        self.batch.clear();
    }

    fn execute(&mut self) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        if state.faults.updates {
            return Err(ConnectionError::Statement(format!("update rejected: {}", self.sql)));
        }
        state.record(&self.sql, &self.options, &self.params);
        run(&mut state, &self.sql, &self.params, false).map(|_| ())
    }

    fn query(&mut self) -> ConnectionResult<Box<dyn RowStream + '_>> {
        let result = {
            let mut state = self.state.borrow_mut();
            state.check_open()?;
            state.record(&self.sql, &self.options, &self.params);
            run(&mut state, &self.sql, &self.params, true)?
        };
        let result = result.unwrap_or(ScriptedResult {
            columns: Vec::new(),
            rows: Vec::new(),
        });
        Ok(Box::new(MemoryRows::open(&self.state, result)))
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        if state.faults.updates {
            return Err(ConnectionError::Statement(format!("update rejected: {}", sql)));
        }
        state.record(sql, options, &[]);
        run(&mut state, sql, &[], false).map(|_| ())
    }

    fn query(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<Box<dyn RowStream + '_>> {
        let result = {
            let mut state = self.state.borrow_mut();
            state.check_open()?;
            state.record(sql, options, &[]);
            run(&mut state, sql, &[], true)?
        };
        let result = result.unwrap_or(ScriptedResult {
            columns: Vec::new(),
            rows: Vec::new(),
        });
        Ok(Box::new(MemoryRows::open(&self.state, result)))
    }

    fn prepare(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<Box<dyn PreparedStatement + '_>> {
        self.state.borrow().check_open()?;
        Ok(Box::new(MemoryStatement {
            state: Rc::clone(&self.state),
            sql: sql.to_string(),
            options: *options,
            params: Vec::new(),
            batch: Vec::new(),
        }))
    }

    fn auto_commit(&self) -> ConnectionResult<bool> {
        let state = self.state.borrow();
        state.check_open()?;
        Ok(state.auto_commit)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        if state.faults.set_auto_commit {
            return Err(ConnectionError::Transaction("autocommit toggle refused".to_string()));
        }
        if enabled == state.auto_commit {
            return Ok(());
        }
        if enabled {
            // Switching autocommit back on publishes the open transaction
            if let Some(working) = state.working.take() {
                state.committed = working;
            }
        } else {
            state.working = Some(state.committed.clone());
        }
        state.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        if state.faults.commit {
            return Err(ConnectionError::Transaction("commit refused by store".to_string()));
        }
        if let Some(working) = state.working.clone() {
            state.committed = working;
        }
        state.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        if state.faults.rollback {
            return Err(ConnectionError::Transaction("rollback refused by store".to_string()));
        }
        if state.working.is_some() {
            state.working = Some(state.committed.clone());
        }
        state.rollbacks += 1;
        Ok(())
    }

    fn supports_transactions(&self) -> ConnectionResult<bool> {
        let state = self.state.borrow();
        state.check_open()?;
        Ok(state.supports_transactions)
    }

    fn isolation(&self) -> ConnectionResult<Isolation> {
        let state = self.state.borrow();
        state.check_open()?;
        Ok(state.isolation)
    }

    fn set_isolation(&mut self, level: Isolation) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.check_open()?;
        state.isolation = level;
        Ok(())
    }

    fn close(&mut self) -> ConnectionResult<()> {
        let mut state = self.state.borrow_mut();
        state.working = None;
        state.closed = true;
        Ok(())
    }
}
