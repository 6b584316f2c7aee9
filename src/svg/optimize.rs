//! Streaming SVG cleanup with quick-xml.
//!
//! A single read/write pass over the event stream:
//!
//! | Pass | Effect |
//! |---|---|
//! | doctype, XML declaration, PIs | dropped |
//! | comments | dropped |
//! | `metadata`, `title`, `desc` | dropped with their subtree |
//! | `sodipodi:*` / `inkscape:*` | elements, attributes and `xmlns:` declarations dropped |
//! | empty attributes | dropped |
//! | attribute whitespace | runs collapsed to one space, ends trimmed |
//! | whitespace-only text | dropped, except inside text-bearing elements |
//! | empty containers | `g`, `defs`, `symbol`, `mask`, `clipPath`, `pattern` without children dropped |
//! | root `xmlns` | dropped when [`OptimizeOptions::remove_root_xmlns`] is set |
//!
//! Attribute values and text are copied as raw bytes, so entities survive
//! untouched.

use super::SvgError;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

const REMOVED_ELEMENTS: &[&[u8]] = &[b"metadata", b"title", b"desc"];
const EDITOR_PREFIXES: &[&[u8]] = &[b"sodipodi", b"inkscape"];
const CONTAINERS: &[&[u8]] = &[b"g", b"defs", b"symbol", b"mask", b"clipPath", b"pattern"];
const TEXT_ELEMENTS: &[&[u8]] = &[b"text", b"tspan", b"textPath", b"style", b"script"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Drop `xmlns` from the root element. Inline SVG in HTML does not need
    /// it; standalone files and data URIs do.
    pub remove_root_xmlns: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            remove_root_xmlns: true,
        }
    }
}

/// Optimize an SVG document. The root element must be `<svg>`.
pub fn optimize(svg: &str, options: &OptimizeOptions) -> Result<String, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut pass = Pass::new(options);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SvgError::Parse(format!("{e} (at byte {})", reader.buffer_position())))?;
        match event {
            Event::Eof => break,
            ev if pass.skip_depth > 0 => match ev {
                Event::Start(_) => pass.skip_depth += 1,
                Event::End(_) => pass.skip_depth -= 1,
                _ => {}
            },
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            Event::Start(start) => {
                let name = start.name().as_ref().to_vec();
                if is_removed_element(&name) {
                    pass.skip_depth = 1;
                    continue;
                }
                let cleaned = pass.clean_start(&start)?;
                if CONTAINERS.contains(&name.as_slice()) {
                    pass.pending.push(cleaned);
                } else {
                    pass.flush()?;
                    pass.write(Event::Start(cleaned))?;
                }
                pass.open.push(name);
            }
            Event::Empty(start) => {
                let name = start.name();
                if is_removed_element(name.as_ref()) || CONTAINERS.contains(&name.as_ref()) {
                    continue;
                }
                let cleaned = pass.clean_start(&start)?;
                pass.flush()?;
                pass.write(Event::Empty(cleaned))?;
            }
            Event::End(end) => {
                pass.open.pop();
                if pass.pending.pop().is_some() {
                    continue;
                }
                pass.write(Event::End(end))?;
            }
            Event::Text(text) => {
                if text.iter().all(u8::is_ascii_whitespace) && !pass.in_text_element() {
                    continue;
                }
                pass.flush()?;
                pass.write(Event::Text(text))?;
            }
            other => {
                pass.flush()?;
                pass.write(other)?;
            }
        }
    }

    if !pass.open.is_empty() {
        return Err(SvgError::Parse("unexpected end of document".to_string()));
    }
    if !pass.seen_root {
        return Err(SvgError::NoRoot);
    }
    String::from_utf8(pass.writer.into_inner()).map_err(|e| SvgError::Parse(e.to_string()))
}

/// Re-serialize an SVG document without indentation.
///
/// The prolog (XML declaration, doctype, PIs) and whitespace-only text outside
/// text-bearing elements are dropped; every element, attribute and comment is
/// kept. The root element must be `<svg>`.
pub fn compact(svg: &str) -> Result<String, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::new());
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SvgError::Parse(format!("{e} (at byte {})", reader.buffer_position())))?;
        match event {
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Start(ref start) | Event::Empty(ref start) if !seen_root => {
                if start.name().as_ref() != b"svg" {
                    return Err(SvgError::NotSvg(
                        String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ));
                }
                seen_root = true;
                if let Event::Start(start) = &event {
                    open.push(start.name().as_ref().to_vec());
                }
            }
            Event::Start(ref start) => open.push(start.name().as_ref().to_vec()),
            Event::End(_) => {
                open.pop();
            }
            Event::Text(ref text)
                if text.iter().all(u8::is_ascii_whitespace)
                    && !open.iter().any(|name| TEXT_ELEMENTS.contains(&name.as_slice())) =>
            {
                continue;
            }
            _ => {}
        }
        writer
            .write_event(event)
            .map_err(|e| SvgError::Write(e.to_string()))?;
    }

    if !open.is_empty() {
        return Err(SvgError::Parse("unexpected end of document".to_string()));
    }
    if !seen_root {
        return Err(SvgError::NoRoot);
    }
    String::from_utf8(writer.into_inner()).map_err(|e| SvgError::Parse(e.to_string()))
}

fn is_editor_name(name: &[u8]) -> bool {
    EDITOR_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix) && name.get(prefix.len()) == Some(&b':'))
}

fn is_removed_element(name: &[u8]) -> bool {
    REMOVED_ELEMENTS.contains(&name) || is_editor_name(name)
}

fn is_removed_attribute(key: &[u8]) -> bool {
    is_editor_name(key)
        || key
            .strip_prefix(b"xmlns:")
            .is_some_and(|prefix| EDITOR_PREFIXES.contains(&prefix))
}

struct Pass<'o> {
    writer: Writer<Vec<u8>>,
    options: &'o OptimizeOptions,
    /// Container starts with nothing written inside them yet.
    pending: Vec<BytesStart<'static>>,
    /// Names of open elements, written or pending.
    open: Vec<Vec<u8>>,
    skip_depth: usize,
    seen_root: bool,
}

impl<'o> Pass<'o> {
    fn new(options: &'o OptimizeOptions) -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            options,
            pending: Vec::new(),
            open: Vec::new(),
            skip_depth: 0,
            seen_root: false,
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), SvgError> {
        self.writer
            .write_event(event)
            .map_err(|e| SvgError::Write(e.to_string()))
    }

    /// Write out pending containers; something is about to go inside them.
    fn flush(&mut self) -> Result<(), SvgError> {
        for start in std::mem::take(&mut self.pending) {
            self.write(Event::Start(start))?;
        }
        Ok(())
    }

    fn in_text_element(&self) -> bool {
        self.open
            .iter()
            .any(|name| TEXT_ELEMENTS.contains(&name.as_slice()))
    }

    fn clean_start(&mut self, start: &BytesStart<'_>) -> Result<BytesStart<'static>, SvgError> {
        let is_root = !self.seen_root;
        if is_root {
            if start.name().as_ref() != b"svg" {
                return Err(SvgError::NotSvg(
                    String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                ));
            }
            self.seen_root = true;
        }

        let mut cleaned = BytesStart::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SvgError::Parse(e.to_string()))?;
            let key = attr.key.as_ref();
            if is_removed_attribute(key) || (is_root && self.options.remove_root_xmlns && key == b"xmlns") {
                continue;
            }
            let value = String::from_utf8_lossy(&attr.value);
            let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                continue;
            }
            cleaned.push_attribute((key, collapsed.as_bytes()));
        }
        Ok(cleaned)
    }
}
