//! Scripted in-memory page handle.
//!
//! `FixturePage` serves pre-built documents keyed by URL, answers the
//! convergence scripts from a height sequence, and resolves the default
//! extraction selectors against a small element tree. It never touches a
//! browser, so the whole pipeline can run in tests.

use super::{PageError, PageHandle, PageResult};
use crate::converge::{HEIGHT_SCRIPT, LOAD_MORE_SCRIPT, RESET_SCRIPT};
use crate::extract::{Selectors, NOT_ARTICULATED_MARKER};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer to the height measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightReading {
    Value(i64),
    /// The page is not script-addressable for this reading.
    Unavailable,
    /// The script ran but produced `null`.
    Null,
    /// The script ran but produced a string.
    Text(&'static str),
}

/// Reference to a node of a fixture document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureElement(usize);

#[derive(Debug, Clone, Default)]
struct FixtureNode {
    text: String,
    children: HashMap<String, Vec<usize>>,
    broken: HashSet<String>,
}

/// Builder for one equivalency row.
#[derive(Debug, Clone, Default)]
pub struct FixtureRow {
    grouping: bool,
    receiving: Vec<String>,
    sending: Vec<String>,
    notes: Vec<String>,
    broken: bool,
}

impl FixtureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receiving<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.receiving = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn sending<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sending = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Tag the row as a category grouping.
    pub fn grouping(mut self) -> Self {
        self.grouping = true;
        self
    }

    /// Add a free-text paragraph to the sending side.
    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.notes.push(text.into());
        self
    }

    /// Mark the sending side as "No Course Articulated".
    pub fn not_articulated(self) -> Self {
        self.note(NOT_ARTICULATED_MARKER)
    }

    /// Make every token lookup inside this row fail.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// A prepared document served by `FixturePage`.
#[derive(Debug, Clone)]
pub struct FixtureDocument {
    selectors: Selectors,
    nodes: Vec<FixtureNode>,
    roots: HashMap<String, Vec<usize>>,
    heights: Vec<HeightReading>,
    ready: bool,
    rows_fail: bool,
    scroll_fails: bool,
}

impl Default for FixtureDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureDocument {
    /// An empty, ready document using the default selectors.
    pub fn new() -> Self {
        Self {
            selectors: Selectors::default(),
            nodes: Vec::new(),
            roots: HashMap::new(),
            heights: Vec::new(),
            ready: true,
            rows_fail: false,
            scroll_fails: false,
        }
    }

    fn push_node(&mut self, text: &str) -> usize {
        self.nodes.push(FixtureNode {
            text: text.to_string(),
            ..FixtureNode::default()
        });
        self.nodes.len() - 1
    }

    fn push_children(&mut self, parent: usize, selector: &str, texts: &[String]) {
        let ids: Vec<usize> = texts.iter().map(|t| self.push_node(t)).collect();
        self.nodes[parent]
            .children
            .entry(selector.to_string())
            .or_default()
            .extend(ids);
    }

    /// Set the page-level institution label text.
    pub fn institution(mut self, label: &str) -> Self {
        let id = self.push_node(label);
        self.roots
            .insert(self.selectors.institution.clone(), vec![id]);
        self
    }

    /// Append an equivalency row.
    pub fn row(mut self, row: FixtureRow) -> Self {
        let id = self.push_node("");
        let sel = self.selectors.clone();
        if row.grouping {
            self.push_children(id, &sel.grouping_marker, &["Area A".to_string()]);
        }
        self.push_children(id, &sel.receiving_tokens, &row.receiving);
        self.push_children(id, &sel.sending_tokens, &row.sending);
        self.push_children(id, &sel.sending_notes, &row.notes);
        if row.broken {
            let node = &mut self.nodes[id];
            node.broken.insert(sel.receiving_tokens.clone());
            node.broken.insert(sel.sending_tokens.clone());
        }
        self.roots.entry(sel.row).or_default().push(id);
        self
    }

    /// Script the height measurements. After the last one the final value repeats.
    pub fn heights<I: IntoIterator<Item = i64>>(self, heights: I) -> Self {
        self.readings(heights.into_iter().map(HeightReading::Value))
    }

    /// Like `heights`, but individual readings may fail.
    pub fn readings<I: IntoIterator<Item = HeightReading>>(mut self, readings: I) -> Self {
        self.heights = readings.into_iter().collect();
        self
    }

    /// The readiness element never appears.
    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Enumerating rows fails, which is fatal for the page.
    pub fn rows_fail(mut self) -> Self {
        self.rows_fail = true;
        self
    }

    /// The load-more and reset scripts throw.
    pub fn scroll_fails(mut self) -> Self {
        self.scroll_fails = true;
        self
    }

    fn reading(&self, cursor: usize) -> HeightReading {
        self.heights
            .get(cursor)
            .or_else(|| self.heights.last())
            .copied()
            .unwrap_or(HeightReading::Value(0))
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    cursor: usize,
    measurements: usize,
    scrolls: usize,
    resets: usize,
}

fn lock(state: &Mutex<ScriptState>) -> std::sync::MutexGuard<'_, ScriptState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory `PageHandle` serving `FixtureDocument`s by URL.
pub struct FixturePage {
    documents: HashMap<String, FixtureDocument>,
    current: Option<String>,
    visited: Vec<String>,
    state: Mutex<ScriptState>,
    closes: Arc<AtomicUsize>,
    close_fails: bool,
}

impl Default for FixturePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FixturePage {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            current: None,
            visited: Vec::new(),
            state: Mutex::new(ScriptState::default()),
            closes: Arc::new(AtomicUsize::new(0)),
            close_fails: false,
        }
    }

    /// Serve `document` when `url` is navigated to.
    pub fn with_document(mut self, url: &str, document: FixtureDocument) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }

    /// Make `close()` report an error.
    pub fn failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    /// Counter incremented every time a handle is closed.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    /// URLs successfully navigated to, in order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Height measurements taken since the last navigation.
    pub fn measurements(&self) -> usize {
        lock(&self.state).measurements
    }

    /// Load-more scrolls issued since the last navigation.
    pub fn scrolls(&self) -> usize {
        lock(&self.state).scrolls
    }

    /// Scroll resets issued since the last navigation.
    pub fn resets(&self) -> usize {
        lock(&self.state).resets
    }

    fn document(&self) -> PageResult<&FixtureDocument> {
        self.current
            .as_ref()
            .and_then(|url| self.documents.get(url))
            .ok_or_else(|| PageError::Navigation("no document loaded".to_string()))
    }
}

#[async_trait]
impl PageHandle for FixturePage {
    type Element = FixtureElement;

    async fn navigate(&mut self, url: &str) -> PageResult<()> {
        if !self.documents.contains_key(url) {
            return Err(PageError::Navigation(format!("{url}: net::ERR_NAME_NOT_RESOLVED")));
        }
        self.current = Some(url.to_string());
        self.visited.push(url.to_string());
        *lock(&self.state) = ScriptState::default();
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        if self.document()?.ready {
            Ok(())
        } else {
            Err(PageError::Timeout(timeout, selector.to_string()))
        }
    }

    async fn execute_js(&self, script: &str) -> PageResult<serde_json::Value> {
        let doc = self.document()?;
        let mut state = lock(&self.state);
        if script == HEIGHT_SCRIPT {
            let reading = doc.reading(state.cursor);
            state.cursor += 1;
            state.measurements += 1;
            return match reading {
                HeightReading::Value(h) => Ok(serde_json::json!(h)),
                HeightReading::Unavailable => {
                    Err(PageError::Script("document is not script-addressable".to_string()))
                }
                HeightReading::Null => Ok(serde_json::Value::Null),
                HeightReading::Text(text) => Ok(serde_json::json!(text)),
            };
        }
        if script == LOAD_MORE_SCRIPT || script == RESET_SCRIPT {
            if script == LOAD_MORE_SCRIPT {
                state.scrolls += 1;
            } else {
                state.resets += 1;
            }
            if doc.scroll_fails {
                return Err(PageError::Script("window is detached".to_string()));
            }
        }
        Ok(serde_json::Value::Null)
    }

    async fn find_element(&self, selector: &str) -> PageResult<FixtureElement> {
        self.document()?
            .roots
            .get(selector)
            .and_then(|ids| ids.first())
            .map(|&id| FixtureElement(id))
            .ok_or_else(|| PageError::NotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> PageResult<Vec<FixtureElement>> {
        let doc = self.document()?;
        if doc.rows_fail && selector == doc.selectors.row {
            return Err(PageError::Lookup(format!("{selector}: stale document")));
        }
        Ok(doc
            .roots
            .get(selector)
            .map(|ids| ids.iter().map(|&id| FixtureElement(id)).collect())
            .unwrap_or_default())
    }

    async fn find_within(
        &self,
        scope: &FixtureElement,
        selector: &str,
    ) -> PageResult<Vec<FixtureElement>> {
        let node = self
            .document()?
            .nodes
            .get(scope.0)
            .ok_or_else(|| PageError::Lookup("stale element".to_string()))?;
        if node.broken.contains(selector) {
            return Err(PageError::Lookup(format!("{selector}: stale element")));
        }
        Ok(node
            .children
            .get(selector)
            .map(|ids| ids.iter().map(|&id| FixtureElement(id)).collect())
            .unwrap_or_default())
    }

    async fn text(&self, element: &FixtureElement) -> PageResult<String> {
        self.document()?
            .nodes
            .get(element.0)
            .map(|n| n.text.trim().to_string())
            .ok_or_else(|| PageError::Lookup("stale element".to_string()))
    }

    async fn close(self) -> PageResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(PageError::Closed);
        }
        Ok(())
    }
}
