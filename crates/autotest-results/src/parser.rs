//! Streaming extraction of `query` elements.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ReportError;

/// The raw shape of one `query` element, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    /// Text of the `id` child.
    pub id: String,
    /// `comment` attribute of the `id` child.
    pub comment: Option<String>,
    /// Text of the `correct` child. `None` when the element is absent,
    /// `Some("")` when it is present but empty.
    pub correct: Option<String>,
    pub passed: bool,
    pub failed: bool,
    pub exception: bool,
    pub timeout: bool,
    /// Unparsed text of the `time_taken` child.
    pub time_taken: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Correct,
    TimeTaken,
}

/// A `query` element that has been opened but not yet closed.
struct OpenQuery {
    depth: usize,
    /// Position in document order, fixed when the element opens.
    slot: usize,
    id: Option<String>,
    raw: RawQuery,
    capturing: Option<Field>,
}

impl OpenQuery {
    fn new(depth: usize, slot: usize) -> Self {
        Self {
            depth,
            slot,
            id: None,
            raw: RawQuery::default(),
            capturing: None,
        }
    }

    /// Handle a direct child element opening. Only the first occurrence of
    /// each text-bearing child is captured.
    fn open_child(&mut self, start: &BytesStart<'_>) -> Result<(), ReportError> {
        self.capturing = None;
        match start.name().as_ref() {
            b"id" if self.id.is_none() => {
                self.id = Some(String::new());
                if let Some(attr) = start.try_get_attribute("comment")? {
                    self.raw.comment = Some(attr.unescape_value()?.into_owned());
                }
                self.capturing = Some(Field::Id);
            }
            b"correct" if self.raw.correct.is_none() => {
                self.raw.correct = Some(String::new());
                self.capturing = Some(Field::Correct);
            }
            b"time_taken" if self.raw.time_taken.is_none() => {
                self.raw.time_taken = Some(String::new());
                self.capturing = Some(Field::TimeTaken);
            }
            b"passed" => self.raw.passed = true,
            b"failed" => self.raw.failed = true,
            b"exception" => self.raw.exception = true,
            b"timeout" => self.raw.timeout = true,
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, depth: usize, text: &str) {
        if depth != self.depth + 1 {
            return;
        }
        let slot = match self.capturing {
            Some(Field::Id) => self.id.as_mut(),
            Some(Field::Correct) => self.raw.correct.as_mut(),
            Some(Field::TimeTaken) => self.raw.time_taken.as_mut(),
            None => None,
        };
        if let Some(slot) = slot {
            slot.push_str(text);
        }
    }

    fn finish(self) -> Result<RawQuery, ReportError> {
        let id = self
            .id
            .ok_or_else(|| ReportError::Malformed("query element without an id".to_string()))?;
        Ok(RawQuery { id, ..self.raw })
    }
}

/// Walks the document and tracks which `query` elements are open.
///
/// A `query` nested inside another is collected as well. Each query is
/// slotted when it opens, so the output keeps start-tag order.
struct Extractor {
    depth: usize,
    seen_root: bool,
    open: Vec<OpenQuery>,
    queries: Vec<Option<RawQuery>>,
}

impl Extractor {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), ReportError> {
        if self.depth == 0 {
            if self.seen_root {
                return Err(ReportError::Malformed(
                    "content after the root element".to_string(),
                ));
            }
            self.seen_root = true;
        }
        self.depth += 1;

        if start.name().as_ref() == b"query" {
            self.open.push(OpenQuery::new(self.depth, self.queries.len()));
            self.queries.push(None);
        } else if let Some(query) = self.open.last_mut() {
            if self.depth == query.depth + 1 {
                query.open_child(start)?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ReportError> {
        match self.open.last().map(|query| query.depth) {
            Some(depth) if depth == self.depth => {
                if let Some(done) = self.open.pop() {
                    let slot = done.slot;
                    self.queries[slot] = Some(done.finish()?);
                }
            }
            Some(depth) if depth + 1 == self.depth => {
                if let Some(query) = self.open.last_mut() {
                    query.capturing = None;
                }
            }
            _ => {}
        }
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| ReportError::Malformed("unmatched end tag".to_string()))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ReportError> {
        if self.depth == 0 {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(ReportError::Malformed(
                "text outside the root element".to_string(),
            ));
        }
        if let Some(query) = self.open.last_mut() {
            query.push_text(self.depth, text);
        }
        Ok(())
    }
}

/// Extract every `query` element of `xml` in document order.
///
/// Only direct children of a `query` are inspected, and a nested `query`
/// is extracted as its own entry after its parent. The whole document is
/// validated: a syntax error anywhere fails the parse, even after queries
/// have been read.
pub fn parse_document(xml: &str) -> Result<Vec<RawQuery>, ReportError> {
    let mut reader = Reader::from_str(xml);
    let mut extractor = Extractor {
        depth: 0,
        seen_root: false,
        open: Vec::new(),
        queries: Vec::new(),
    };

    loop {
        match reader.read_event()? {
            Event::Start(start) => extractor.open(&start)?,
            Event::Empty(start) => {
                extractor.open(&start)?;
                extractor.close()?;
            }
            Event::End(_) => extractor.close()?,
            Event::Text(text) => extractor.text(&text.unescape()?)?,
            Event::CData(data) => {
                let bytes = data.into_inner();
                extractor.text(&String::from_utf8_lossy(&bytes))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if extractor.depth != 0 {
        return Err(ReportError::Malformed(
            "unexpected end of document".to_string(),
        ));
    }
    if !extractor.seen_root {
        return Err(ReportError::Malformed("no root element".to_string()));
    }

    Ok(extractor.queries.into_iter().flatten().collect())
}
