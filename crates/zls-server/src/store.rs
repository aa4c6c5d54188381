//! Document store contract.
//!
//! The kernel consumes open buffers only through the [`DocumentStore`]
//! trait: open/change/save/close bookkeeping, URI resolution, and the
//! build-file association cache. The diff arithmetic that turns protocol
//! positions into byte edits belongs to the store implementation, not to
//! the dispatch core; [`InMemoryDocumentStore`] is the binding the binary
//! and the tests run on.

use std::collections::HashMap;

use lsp_types::{Position, TextDocumentContentChangeEvent, TextDocumentItem, Uri};
use tracing::warn;

use crate::capabilities::OffsetEncoding;

/// Tracing target for store operations.
const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// One open text buffer, as handed across the store seam.
#[derive(Debug, Clone)]
pub struct TextDocument {
    /// Document URI, as opened by the client.
    pub uri: Uri,
    /// Language identifier reported at open.
    pub language_id: String,
    /// Client-side version of the current content.
    pub version: i32,
    /// Full buffer text.
    pub text: String,
}

/// Contract the dispatch core holds the document store to.
///
/// Implementations own the text and its edit arithmetic; the core never
/// computes offsets itself.
pub trait DocumentStore: Send {
    /// Tracks a newly opened document, replacing any stale entry.
    fn open(&mut self, item: TextDocumentItem);

    /// Applies changes to an open document.
    ///
    /// Returns `false` when the URI is not open.
    fn change(
        &mut self,
        uri: &Uri,
        changes: &[TextDocumentContentChangeEvent],
        version: i32,
        encoding: OffsetEncoding,
    ) -> bool;

    /// Drops a closed document and its build-file association.
    fn close(&mut self, uri: &Uri) -> Option<TextDocument>;

    /// Looks up an open document.
    fn get(&self, uri: &Uri) -> Option<&TextDocument>;

    /// Number of open documents.
    fn open_count(&self) -> usize;

    /// Records which build file governs a document.
    fn associate_build_file(&mut self, document: Uri, build_file: Uri);

    /// Cached build file for a document, when known.
    fn build_file_for(&self, document: &Uri) -> Option<&Uri>;

    /// Drops every cached build-file association.
    ///
    /// Called when the toolchain executable changes, since the
    /// associations were resolved against the old toolchain.
    fn invalidate_build_files(&mut self);
}

/// In-memory store binding used by the binary and the tests.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: HashMap<Uri, TextDocument>,
    build_files: HashMap<Uri, Uri>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn open(&mut self, item: TextDocumentItem) {
        let document = TextDocument {
            uri: item.uri.clone(),
            language_id: item.language_id,
            version: item.version,
            text: item.text,
        };
        self.documents.insert(item.uri, document);
    }

    fn change(
        &mut self,
        uri: &Uri,
        changes: &[TextDocumentContentChangeEvent],
        version: i32,
        encoding: OffsetEncoding,
    ) -> bool {
        match self.documents.get_mut(uri) {
            Some(document) => {
                apply_changes(document, changes, version, encoding);
                true
            }
            None => false,
        }
    }

    fn close(&mut self, uri: &Uri) -> Option<TextDocument> {
        self.build_files.remove(uri);
        self.documents.remove(uri)
    }

    fn get(&self, uri: &Uri) -> Option<&TextDocument> {
        self.documents.get(uri)
    }

    fn open_count(&self) -> usize {
        self.documents.len()
    }

    fn associate_build_file(&mut self, document: Uri, build_file: Uri) {
        self.build_files.insert(document, build_file);
    }

    fn build_file_for(&self, document: &Uri) -> Option<&Uri> {
        self.build_files.get(document)
    }

    fn invalidate_build_files(&mut self) {
        self.build_files.clear();
    }
}

/// Applies a batch of content changes in order.
///
/// Positions outside the current text are clamped; the protocol already
/// promises well-formed ranges, so a clamped edit is logged rather than
/// rejected.
fn apply_changes(
    document: &mut TextDocument,
    changes: &[TextDocumentContentChangeEvent],
    version: i32,
    encoding: OffsetEncoding,
) {
    for change in changes {
        match change.range {
            Some(range) => {
                let start = byte_offset(&document.text, range.start, encoding);
                let end = byte_offset(&document.text, range.end, encoding);
                if start > end {
                    warn!(
                        target: STORE_TARGET,
                        uri = document.uri.as_str(),
                        "ignoring inverted edit range"
                    );
                    continue;
                }
                document.text.replace_range(start..end, &change.text);
            }
            None => document.text = change.text.clone(),
        }
    }
    document.version = version;
}

/// Byte offset of a protocol position, measured in the session's encoding.
fn byte_offset(text: &str, position: Position, encoding: OffsetEncoding) -> usize {
    let start = line_start(text, position.line);
    let line_end = text[start..]
        .find('\n')
        .map_or(text.len(), |offset| start + offset);
    start + column_to_byte(&text[start..line_end], position.character, encoding)
}

fn line_start(text: &str, line: u32) -> usize {
    let mut start = 0;
    for _ in 0..line {
        match text[start..].find('\n') {
            Some(offset) => start += offset + 1,
            None => return text.len(),
        }
    }
    start
}

fn column_to_byte(line: &str, column: u32, encoding: OffsetEncoding) -> usize {
    let mut units: u32 = 0;
    for (index, character) in line.char_indices() {
        if units >= column {
            return index;
        }
        units += match encoding {
            OffsetEncoding::Utf8 => character.len_utf8() as u32,
            OffsetEncoding::Utf16 => character.len_utf16() as u32,
            OffsetEncoding::Utf32 => 1,
        };
    }
    line.len()
}
