//! The language server: document lifecycle, request dispatch, and the
//! persistent analysis worker.
//!
//! Concurrency model: the I/O loop owns the documents and blocks only in
//! the 100 ms message poll; the worker sleeps on a condition variable
//! and takes at most one queued `AnalysisWork` at a time, round-robin
//! across documents. A later edit replaces a document's queued work
//! before pickup, so diagnostics for superseded versions are never
//! published. Completed work is parked in a per-document slot the I/O
//! loop drains before serving position queries.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use jolt_common::{Location, Position};
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::analysis::AnalysisWork;
use crate::documents::Document;
use crate::framing::{MessageReader, MessageWriter, Poll};
use crate::protocol::{self, RpcMessage};

/// How long the I/O loop waits for a message before re-checking state.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// Work queue
// =============================================================================

struct QueueState {
    /// Queued work per document; replacement is cancellation.
    pending: FxHashMap<String, Box<AnalysisWork>>,
    /// Round-robin pickup order over document URIs.
    order: VecDeque<String>,
    shutdown: bool,
}

/// The (mutex, condvar, per-document slot) queue between the I/O loop
/// and the worker.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
    /// Completed work awaiting pickup, exchanged like an SPSC slot:
    /// the worker stores, the I/O loop removes.
    completed: Mutex<FxHashMap<String, Box<AnalysisWork>>>,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: FxHashMap::default(),
                order: VecDeque::new(),
                shutdown: false,
            }),
            ready: Condvar::new(),
            completed: Mutex::new(FxHashMap::default()),
        }
    }

    /// Queue work for its document, dropping any unprocessed previous
    /// entry for the same document.
    fn enqueue(&self, work: Box<AnalysisWork>) {
        let mut state = self.state.lock().expect("work lock poisoned");
        let uri = work.uri.clone();
        if state.pending.insert(uri.clone(), work).is_none() {
            state.order.push_back(uri);
        }
        drop(state);
        self.ready.notify_one();
    }

    /// Worker side: block until one unit of work (or shutdown).
    fn take_next(&self) -> Option<Box<AnalysisWork>> {
        let mut state = self.state.lock().expect("work lock poisoned");
        loop {
            while let Some(uri) = state.order.pop_front() {
                if let Some(work) = state.pending.remove(&uri) {
                    return Some(work);
                }
                // Stale queue entry (document closed); keep scanning.
            }
            if state.shutdown {
                return None;
            }
            state = self.ready.wait(state).expect("work lock poisoned");
        }
    }

    fn discard(&self, uri: &str) {
        let mut state = self.state.lock().expect("work lock poisoned");
        state.pending.remove(uri);
        drop(state);
        self.completed
            .lock()
            .expect("completed lock poisoned")
            .remove(uri);
    }

    fn begin_shutdown(&self) {
        self.state.lock().expect("work lock poisoned").shutdown = true;
        self.ready.notify_all();
    }

    fn publish_completed(&self, work: Box<AnalysisWork>) {
        self.completed
            .lock()
            .expect("completed lock poisoned")
            .insert(work.uri.clone(), work);
    }

    /// I/O side: the exchange-to-null on the completed slot.
    fn take_completed(&self, uri: &str) -> Option<Box<AnalysisWork>> {
        self.completed
            .lock()
            .expect("completed lock poisoned")
            .remove(uri)
    }
}

fn worker_loop(queue: Arc<WorkQueue>, writer: Arc<MessageWriter>) {
    while let Some(mut work) = queue.take_next() {
        debug!(uri = %work.uri, version = work.version, "running inference");
        work.run_inference();
        let params = json!({
            "uri": work.uri,
            "diagnostics": work.lsp_diagnostics(),
        });
        let message = protocol::notification("textDocument/publishDiagnostics", params);
        if let Err(err) = writer.write(&message) {
            warn!(error = %err, "failed to publish diagnostics");
        }
        queue.publish_completed(work);
    }
}

// =============================================================================
// Server
// =============================================================================

pub struct LanguageServer {
    reader: MessageReader,
    writer: Arc<MessageWriter>,
    documents: FxHashMap<String, Document>,
    queue: Arc<WorkQueue>,
    worker: Option<std::thread::JoinHandle<()>>,
    shutdown_requested: bool,
}

impl LanguageServer {
    #[must_use]
    pub fn new(reader: MessageReader, writer: MessageWriter) -> Self {
        let writer = Arc::new(writer);
        let queue = Arc::new(WorkQueue::new());
        let worker = {
            let queue = Arc::clone(&queue);
            let writer = Arc::clone(&writer);
            std::thread::Builder::new()
                .name("jolt-lsp-worker".to_string())
                .spawn(move || worker_loop(queue, writer))
                .expect("failed to spawn worker thread")
        };
        Self {
            reader,
            writer,
            documents: FxHashMap::default(),
            queue,
            worker: Some(worker),
            shutdown_requested: false,
        }
    }

    #[must_use]
    pub fn over_stdio() -> Self {
        Self::new(MessageReader::stdin(), MessageWriter::stdout())
    }

    /// Run the message loop until `exit` or end of input. Returns the
    /// process exit code (0 after an orderly `shutdown`, 1 otherwise).
    pub fn run(&mut self) -> i32 {
        info!("jolt-lsp ready");
        let exit_code = loop {
            match self.reader.poll(POLL_INTERVAL) {
                Poll::Timeout => continue,
                Poll::Closed => break 1,
                Poll::Message(text) => {
                    let message: RpcMessage = match serde_json::from_str(&text) {
                        Ok(message) => message,
                        Err(err) => {
                            self.send(&protocol::error_response(
                                &Value::Null,
                                protocol::PARSE_ERROR,
                                &format!("invalid message: {err}"),
                            ));
                            continue;
                        }
                    };
                    if self.dispatch(message) {
                        break i32::from(!self.shutdown_requested);
                    }
                }
            }
        };
        self.queue.begin_shutdown();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        exit_code
    }

    fn send(&self, message: &str) {
        if let Err(err) = self.writer.write(message) {
            warn!(error = %err, "failed to write message");
        }
    }

    /// Handle one message; returns true when the server should exit.
    fn dispatch(&mut self, message: RpcMessage) -> bool {
        let Some(method) = message.method.clone() else {
            // A response from the client; nothing to route it to.
            return false;
        };
        if self.shutdown_requested && method != "exit" {
            // Only `exit` is allowed once shutdown has been requested.
            if let Some(id) = message.id {
                self.send(&protocol::error_response(
                    &id,
                    protocol::INVALID_REQUEST,
                    "server is shutting down",
                ));
            }
            return false;
        }
        match (message.id, method.as_str()) {
            (Some(id), "initialize") => {
                self.send(&protocol::response(&id, protocol::server_capabilities()));
            }
            (None, "initialized") => {}
            (Some(id), "shutdown") => {
                self.shutdown_requested = true;
                self.send(&protocol::response(&id, Value::Null));
            }
            (_, "exit") => return true,
            (None, "textDocument/didOpen") => self.on_did_open(message.params),
            (None, "textDocument/didChange") => self.on_did_change(message.params),
            (None, "textDocument/didClose") => self.on_did_close(message.params),
            (None, "textDocument/didSave") => self.on_did_save(message.params),
            (Some(id), "textDocument/hover") => {
                // Infrastructure point: no hover content yet.
                self.send(&protocol::response(&id, Value::Null));
            }
            (Some(id), "textDocument/completion") => {
                // Infrastructure point: no completion items yet.
                self.send(&protocol::response(&id, json!([])));
            }
            (Some(id), "textDocument/definition") => {
                match self.on_definition(message.params) {
                    Ok(result) => self.send(&protocol::response(&id, result)),
                    Err(err) => self.send(&protocol::error_response(
                        &id,
                        protocol::INTERNAL_ERROR,
                        &err,
                    )),
                }
            }
            (Some(id), "textDocument/references") => {
                match self.on_references(message.params) {
                    Ok(result) => self.send(&protocol::response(&id, result)),
                    Err(err) => self.send(&protocol::error_response(
                        &id,
                        protocol::INTERNAL_ERROR,
                        &err,
                    )),
                }
            }
            (Some(id), _) => {
                self.send(&protocol::error_response(
                    &id,
                    protocol::METHOD_NOT_FOUND,
                    &format!("unknown method '{method}'"),
                ));
            }
            (None, _) => {
                debug!(method = %method, "ignoring unknown notification");
            }
        }
        false
    }

    // =========================================================================
    // Document lifecycle
    // =========================================================================

    fn on_did_open(&mut self, params: Value) {
        let params: protocol::DidOpenParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "malformed didOpen; dropped");
                return;
            }
        };
        let item = params.text_document;
        debug!(uri = %item.uri, language = %item.language_id, "didOpen");
        let mut document = Document::new(
            item.uri.clone(),
            item.language_id,
            item.version,
            item.text,
        );
        // Dispatch on the advertised languageId, not the file extension.
        if document.language_id == "jolt" {
            self.analyze(&mut document);
        }
        self.documents.insert(item.uri, document);
    }

    fn on_did_change(&mut self, params: Value) {
        let params: protocol::DidChangeParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "malformed didChange; dropped");
                return;
            }
        };
        let uri = params.text_document.uri;
        let Some(mut document) = self.documents.remove(&uri) else {
            warn!(uri = %uri, "didChange for unopened document; dropped");
            return;
        };
        for change in params.content_changes {
            match change.range {
                Some(range) => {
                    if let Err(err) = document.text.apply_edit(range, &change.text) {
                        warn!(uri = %uri, error = %err, "bad edit range; change dropped");
                        self.documents.insert(uri, document);
                        return;
                    }
                }
                None => document.text.replace(change.text),
            }
        }
        document.version = params.text_document.version;
        if document.language_id == "jolt" {
            self.analyze(&mut document);
        }
        self.documents.insert(uri, document);
    }

    fn on_did_close(&mut self, params: Value) {
        let params: protocol::DocumentParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "malformed didClose; dropped");
                return;
            }
        };
        let uri = params.text_document.uri;
        debug!(uri = %uri, "didClose");
        self.documents.remove(&uri);
        self.queue.discard(&uri);
    }

    fn on_did_save(&mut self, params: Value) {
        let params: protocol::DocumentParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "malformed didSave; dropped");
                return;
            }
        };
        // Re-analyze from the current buffer; the editor may have
        // formatting-on-save or external tooling in play.
        let uri = params.text_document.uri;
        if let Some(mut document) = self.documents.remove(&uri) {
            if document.language_id == "jolt" {
                self.analyze(&mut document);
            }
            self.documents.insert(uri, document);
        }
    }

    /// Parse on the I/O thread, refresh the document's index from the
    /// untyped tree, and hand the work to the worker for inference.
    fn analyze(&mut self, document: &mut Document) {
        let work = Box::new(AnalysisWork::parse(
            &document.uri,
            document.version,
            document.text.as_str(),
        ));
        document.index = Some(work.build_index());
        self.queue.enqueue(work);
    }

    /// Pick up the worker's completed analysis (if any) and rebuild the
    /// document's index from the typed tree.
    fn refresh_index(&mut self, uri: &str) {
        if let Some(work) = self.queue.take_completed(uri) {
            if let Some(document) = self.documents.get_mut(uri) {
                document.index = Some(work.build_index());
            }
        }
    }

    // =========================================================================
    // Position queries
    // =========================================================================

    fn on_definition(&mut self, params: Value) -> Result<Value, String> {
        let params: protocol::PositionParams =
            serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))?;
        let uri = params.text_document.uri;
        self.refresh_index(&uri);
        Ok(match self.lookup_definition(&uri, params.position) {
            Some(location) => serde_json::to_value(location).unwrap_or(Value::Null),
            None => Value::Null,
        })
    }

    fn lookup_definition(&self, uri: &str, position: Position) -> Option<Location> {
        let document = self.documents.get(uri)?;
        let index = document.index.as_ref()?;
        let entry = index.find_at_position(position)?;
        let info = index.info(entry.info);
        Some(Location::new(uri.to_string(), info.decl_range))
    }

    fn on_references(&mut self, params: Value) -> Result<Value, String> {
        let params: protocol::ReferenceParams =
            serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))?;
        let uri = params.text_document.uri;
        self.refresh_index(&uri);

        let Some(document) = self.documents.get(&uri) else {
            return Ok(Value::Null);
        };
        let Some(index) = document.index.as_ref() else {
            return Ok(Value::Null);
        };
        let Some(entry) = index.find_at_position(params.position) else {
            return Ok(Value::Null);
        };
        let locations: Vec<Location> = index
            .references_of(entry.info, params.context.include_declaration)
            .into_iter()
            .map(|e| Location::new(uri.clone(), e.range))
            .collect();
        Ok(serde_json::to_value(locations).unwrap_or(Value::Null))
    }
}

#[cfg(test)]
#[path = "../tests/server_tests.rs"]
mod tests;
