//! Atom feed conversion.
//!
//! Splunk answers every management endpoint with an Atom feed whose entries
//! carry their attributes as an `<s:dict>` of `<s:key>` elements. The
//! converter works on a fully buffered document and produces one
//! [`AtomRecord`] per feed element: index 0 is the feed itself, the rest are
//! its entries in document order.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use crate::error::{Result, SplunkError};
use crate::value::{Attributes, Value};

/// OpenSearch paging elements kept on the feed header record.
const PAGING_FIELDS: &[&str] = &["totalResults", "itemsPerPage", "startIndex"];

type XmlReader<'a> = Reader<&'a [u8]>;

/// One feed element converted to attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomRecord {
    /// Full server URL or path of the element.
    pub id: String,
    pub title: Option<String>,
    pub updated: Option<String>,
    /// `<link>` targets keyed by `rel`.
    pub links: BTreeMap<String, String>,
    pub fields: Attributes,
}

impl AtomRecord {
    /// Look up a link by relation, e.g. `"alternate"` or `"edit"`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).map(String::as_str)
    }

    /// The `totalResults` count on a feed header, if the server sent one.
    pub fn total_results(&self) -> Option<usize> {
        self.fields
            .get("totalResults")
            .and_then(Value::to_int)
            .and_then(|n| usize::try_from(n).ok())
    }
}

/// The member entries of a converted feed (everything after the header).
pub fn members(records: &[AtomRecord]) -> &[AtomRecord] {
    records.get(1..).unwrap_or(&[])
}

/// Convert a buffered Atom document into records.
///
/// # Example
///
/// ```
/// let xml = br#"<feed xmlns:s="http://dev.splunk.com/ns/rest">
///   <id>https://localhost:8089/services/data/inputs/tcp/raw</id>
///   <entry>
///     <id>https://localhost:8089/services/data/inputs/tcp/raw/9999</id>
///     <content type="text/xml"><s:dict><s:key name="index">main</s:key></s:dict></content>
///   </entry>
/// </feed>"#;
///
/// let records = splunk_client::atom::parse_feed(xml).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].fields["index"].as_str(), Some("main"));
/// ```
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<AtomRecord>> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(&e);
                if name != "feed" {
                    return Err(SplunkError::Parse(format!(
                        "expected <feed> document root, found <{name}>"
                    )));
                }
                return parse_feed_body(&mut reader);
            }
            Event::Empty(e) => {
                return Err(SplunkError::Parse(format!(
                    "empty <{}> document root",
                    local_name(&e)
                )));
            }
            Event::Text(t) if !is_blank(&t) => {
                return Err(SplunkError::Parse("text before document root".into()));
            }
            Event::Eof => return Err(SplunkError::Parse("empty document".into())),
            _ => {}
        }
        buf.clear();
    }
}

/// Extract `<msg>` texts from a Splunk error response.
///
/// Error bodies look like
/// `<response><messages><msg type="ERROR">…</msg></messages></response>`.
/// Anything unparseable simply yields fewer messages.
pub fn error_messages(bytes: &[u8]) -> Vec<String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut messages = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if local_name(&e) == "msg" => match read_text(&mut reader) {
                Ok(text) if !text.is_empty() => messages.push(text),
                Ok(_) => {}
                Err(_) => break,
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    messages
}

/// Fields of a record under construction; `id` is checked on completion.
#[derive(Default)]
struct PartialRecord {
    id: Option<String>,
    title: Option<String>,
    updated: Option<String>,
    links: BTreeMap<String, String>,
    fields: Attributes,
}

impl PartialRecord {
    fn add_link(&mut self, e: &BytesStart<'_>) -> Result<()> {
        if let Some(href) = attribute(e, b"href")? {
            let rel = attribute(e, b"rel")?.unwrap_or_else(|| "alternate".to_string());
            self.links.insert(rel, href);
        }
        Ok(())
    }

    fn finish(self, element: &str) -> Result<AtomRecord> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SplunkError::Parse(format!("<{element}> without <id>")))?;

        Ok(AtomRecord {
            id,
            title: self.title,
            updated: self.updated,
            links: self.links,
            fields: self.fields,
        })
    }
}

fn parse_feed_body(reader: &mut XmlReader<'_>) -> Result<Vec<AtomRecord>> {
    let mut header = PartialRecord::default();
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "entry" => entries.push(parse_entry(reader)?),
                    "id" => header.id = Some(read_text(reader)?),
                    "title" => header.title = Some(read_text(reader)?),
                    "updated" => header.updated = Some(read_text(reader)?),
                    "link" => {
                        header.add_link(&e)?;
                        skip_element(reader)?;
                    }
                    paging if PAGING_FIELDS.contains(&paging) => {
                        let text = read_text(reader)?;
                        header.fields.insert(paging.to_string(), Value::Scalar(text));
                    }
                    _ => skip_element(reader)?,
                }
            }
            Event::Empty(e) if local_name(&e) == "link" => header.add_link(&e)?,
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("feed")),
            _ => {}
        }
        buf.clear();
    }

    trace!(entries = entries.len(), "converted feed");

    let mut records = Vec::with_capacity(entries.len() + 1);
    records.push(header.finish("feed")?);
    records.extend(entries);
    Ok(records)
}

fn parse_entry(reader: &mut XmlReader<'_>) -> Result<AtomRecord> {
    let mut entry = PartialRecord::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(&e).as_str() {
                "id" => entry.id = Some(read_text(reader)?),
                "title" => entry.title = Some(read_text(reader)?),
                "updated" => entry.updated = Some(read_text(reader)?),
                "content" => entry.fields = parse_content(reader)?,
                "link" => {
                    entry.add_link(&e)?;
                    skip_element(reader)?;
                }
                _ => skip_element(reader)?,
            },
            Event::Empty(e) if local_name(&e) == "link" => entry.add_link(&e)?,
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("entry")),
            _ => {}
        }
        buf.clear();
    }

    entry.finish("entry")
}

/// `<content>` holds a single `<s:dict>`; plain-text content has no fields.
fn parse_content(reader: &mut XmlReader<'_>) -> Result<Attributes> {
    let mut fields = Attributes::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if local_name(&e) == "dict" {
                    fields = parse_dict(reader)?;
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("content")),
            _ => {}
        }
        buf.clear();
    }

    Ok(fields)
}

fn parse_dict(reader: &mut XmlReader<'_>) -> Result<BTreeMap<String, Value>> {
    let mut map = BTreeMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let key = dict_key(&e)?;
                let value = parse_key(reader, &key)?;
                map.insert(key, value);
            }
            Event::Empty(e) => {
                let key = dict_key(&e)?;
                map.insert(key, Value::Scalar(String::new()));
            }
            Event::Text(t) if !is_blank(&t) => {
                return Err(SplunkError::Parse("stray text inside <s:dict>".into()));
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("s:dict")),
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

/// Name of an `<s:key>` element inside a dict.
fn dict_key(e: &BytesStart<'_>) -> Result<String> {
    let element = local_name(e);
    if element != "key" {
        return Err(SplunkError::Parse(format!(
            "unexpected <{element}> inside <s:dict>"
        )));
    }
    attribute(e, b"name")?
        .ok_or_else(|| SplunkError::Parse("<s:key> without a name attribute".into()))
}

/// Read the value of one `<s:key>`: text, a nested dict, or a list.
fn parse_key(reader: &mut XmlReader<'_>, key: &str) -> Result<Value> {
    let mut text = String::new();
    let mut container: Option<Value> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let value = match local_name(&e).as_str() {
                    "dict" => Value::Map(parse_dict(reader)?),
                    "list" => Value::List(parse_list(reader, key)?),
                    other => {
                        return Err(SplunkError::Parse(format!(
                            "key `{key}` has unexpected <{other}> value container"
                        )));
                    }
                };
                set_container(&mut container, value, key)?;
            }
            Event::Empty(e) => {
                let value = match local_name(&e).as_str() {
                    "dict" => Value::Map(BTreeMap::new()),
                    "list" => Value::List(Vec::new()),
                    other => {
                        return Err(SplunkError::Parse(format!(
                            "key `{key}` has unexpected <{other}> value container"
                        )));
                    }
                };
                set_container(&mut container, value, key)?;
            }
            Event::Text(t) => text.push_str(&decode_text(&t)?),
            Event::CData(c) => text.push_str(&decode_cdata(&c)?),
            Event::GeneralRef(r) => text.push_str(&resolve_reference(&r)?),
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("s:key")),
            _ => {}
        }
        buf.clear();
    }

    match container {
        Some(_) if !text.trim().is_empty() => Err(SplunkError::Parse(format!(
            "key `{key}` mixes text with a nested value"
        ))),
        Some(value) => Ok(value),
        None => Ok(Value::Scalar(text)),
    }
}

fn set_container(slot: &mut Option<Value>, value: Value, key: &str) -> Result<()> {
    if slot.is_some() {
        return Err(SplunkError::Parse(format!(
            "key `{key}` has more than one value container"
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_list(reader: &mut XmlReader<'_>, key: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                expect_item(&e, key)?;
                match parse_key(reader, key)? {
                    Value::Scalar(item) => items.push(item),
                    _ => {
                        return Err(SplunkError::Parse(format!(
                            "list item under `{key}` holds nested structure"
                        )));
                    }
                }
            }
            Event::Empty(e) => {
                expect_item(&e, key)?;
                items.push(String::new());
            }
            Event::Text(t) if !is_blank(&t) => {
                return Err(SplunkError::Parse(format!(
                    "stray text inside list under `{key}`"
                )));
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("s:list")),
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn expect_item(e: &BytesStart<'_>, key: &str) -> Result<()> {
    let element = local_name(e);
    if element == "item" {
        Ok(())
    } else {
        Err(SplunkError::Parse(format!(
            "unexpected <{element}> inside list under `{key}`"
        )))
    }
}

/// Read the text of the current element up to its end tag.
fn read_text(reader: &mut XmlReader<'_>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&decode_text(&t)?),
            Event::CData(c) => text.push_str(&decode_cdata(&c)?),
            Event::GeneralRef(r) => text.push_str(&resolve_reference(&r)?),
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("text element")),
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

/// Skip the rest of an element whose start tag was just read.
fn skip_element(reader: &mut XmlReader<'_>) -> Result<()> {
    let mut depth = 1usize;
    let mut buf = Vec::new();

    while depth > 0 {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof("element")),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SplunkError::Parse(format!("bad attribute: {err}")))?;
        if attr.key.local_name().as_ref() == name {
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|err| SplunkError::Parse(format!("invalid UTF-8 in attribute: {err}")))?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(|err| SplunkError::Parse(format!("bad attribute escape: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn decode_text(t: &[u8]) -> Result<String> {
    let raw = std::str::from_utf8(t)
        .map_err(|err| SplunkError::Parse(format!("invalid UTF-8 in text: {err}")))?;
    let text = quick_xml::escape::unescape(raw)
        .map_err(|err| SplunkError::Parse(format!("bad text escape: {err}")))?;
    Ok(text.into_owned())
}

fn decode_cdata(c: &[u8]) -> Result<String> {
    std::str::from_utf8(c)
        .map(String::from)
        .map_err(|err| SplunkError::Parse(format!("invalid UTF-8 in CDATA: {err}")))
}

/// Resolve `&name;` or `&#N;` reported as a separate event.
fn resolve_reference(r: &[u8]) -> Result<String> {
    let name = std::str::from_utf8(r)
        .map_err(|err| SplunkError::Parse(format!("invalid UTF-8 in reference: {err}")))?;

    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| SplunkError::Parse(format!("invalid character reference &{name};")));
    }

    quick_xml::escape::resolve_predefined_entity(name)
        .map(String::from)
        .ok_or_else(|| SplunkError::Parse(format!("unknown entity &{name};")))
}

fn is_blank(t: &[u8]) -> bool {
    t.iter().all(u8::is_ascii_whitespace)
}

fn unexpected_eof(element: &str) -> SplunkError {
    SplunkError::Parse(format!("unexpected end of document inside <{element}>"))
}
