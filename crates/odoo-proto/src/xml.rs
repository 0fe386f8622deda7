//! Minimal pull reader and escaping for the XML subset XML-RPC uses.
//!
//! XML-RPC documents are small and regular: no namespaces matter, attributes
//! never carry data, and mixed content only appears as untyped `<value>` text.
//! The reader therefore yields just four event kinds and skips prologs,
//! comments and doctype declarations.

use std::borrow::Cow;

use crate::Error;

/// A single parse event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event<'a> {
    /// `<name ...>`
    Start(&'a str),
    /// `<name .../>`
    Empty(&'a str),
    /// `</name>`
    End(&'a str),
    /// Character data with entities resolved.
    Text(String),
}

impl Event<'_> {
    fn describe(&self) -> String {
        match self {
            Event::Start(name) => name.to_string(),
            Event::Empty(name) => format!("{}/", name),
            Event::End(name) => format!("/{}", name),
            Event::Text(_) => "#text".to_string(),
        }
    }
}

/// Pull reader over an XML document held in memory.
pub(crate) struct Reader<'a> {
    input: &'a str,
    pos: usize,
    peeked: Option<Event<'a>>,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            peeked: None,
        }
    }

    /// Look at the next event without consuming it.
    pub(crate) fn peek(&mut self) -> Result<Option<&Event<'a>>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.read_event()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume the next event.
    pub(crate) fn next_event(&mut self) -> Result<Option<Event<'a>>, Error> {
        match self.peeked.take() {
            Some(event) => Ok(Some(event)),
            None => self.read_event(),
        }
    }

    /// Skip whitespace-only character data.
    pub(crate) fn skip_whitespace(&mut self) -> Result<(), Error> {
        loop {
            let blank = matches!(self.peek()?, Some(Event::Text(t)) if t.trim().is_empty());
            if !blank {
                return Ok(());
            }
            self.next_event()?;
        }
    }

    /// Consume `<name>` or `<name/>`. Returns `true` for the self-closing form.
    pub(crate) fn expect_start(&mut self, name: &str) -> Result<bool, Error> {
        self.skip_whitespace()?;
        match self.next_event()? {
            Some(Event::Start(found)) if found == name => Ok(false),
            Some(Event::Empty(found)) if found == name => Ok(true),
            Some(other) => Err(Error::UnexpectedTag {
                expected: name.to_string(),
                found: other.describe(),
            }),
            None => Err(Error::UnexpectedEof(name.to_string())),
        }
    }

    /// Consume `</name>`.
    pub(crate) fn expect_end(&mut self, name: &str) -> Result<(), Error> {
        self.skip_whitespace()?;
        match self.next_event()? {
            Some(Event::End(found)) if found == name => Ok(()),
            Some(other) => Err(Error::UnexpectedTag {
                expected: format!("/{}", name),
                found: other.describe(),
            }),
            None => Err(Error::UnexpectedEof(name.to_string())),
        }
    }

    /// Collect character data up to and including `</name>`.
    pub(crate) fn read_text(&mut self, name: &str) -> Result<String, Error> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Some(Event::Text(chunk)) => text.push_str(&chunk),
                Some(Event::End(found)) if found == name => return Ok(text),
                Some(other) => {
                    return Err(Error::UnexpectedTag {
                        expected: format!("/{}", name),
                        found: other.describe(),
                    })
                }
                None => return Err(Error::UnexpectedEof(name.to_string())),
            }
        }
    }

    /// Fail unless only whitespace remains.
    pub(crate) fn expect_eof(&mut self) -> Result<(), Error> {
        self.skip_whitespace()?;
        match self.next_event()? {
            None => Ok(()),
            Some(other) => Err(Error::InvalidMessage(format!(
                "trailing content after document: {}",
                other.describe()
            ))),
        }
    }

    fn read_event(&mut self) -> Result<Option<Event<'a>>, Error> {
        let input = self.input;
        loop {
            let rest = &input[self.pos..];
            if rest.is_empty() {
                return Ok(None);
            }

            if let Some(after) = rest.strip_prefix("<?") {
                let end = after
                    .find("?>")
                    .ok_or_else(|| Error::UnexpectedEof("?xml".to_string()))?;
                self.pos += 2 + end + 2;
                continue;
            }

            if let Some(after) = rest.strip_prefix("<!--") {
                let end = after
                    .find("-->")
                    .ok_or_else(|| Error::UnexpectedEof("!--".to_string()))?;
                self.pos += 4 + end + 3;
                continue;
            }

            if let Some(after) = rest.strip_prefix("<![CDATA[") {
                let end = after
                    .find("]]>")
                    .ok_or_else(|| Error::UnexpectedEof("![CDATA[".to_string()))?;
                self.pos += 9 + end + 3;
                return Ok(Some(Event::Text(after[..end].to_string())));
            }

            if let Some(after) = rest.strip_prefix("<!") {
                let end = after
                    .find('>')
                    .ok_or_else(|| Error::UnexpectedEof("!DOCTYPE".to_string()))?;
                self.pos += 2 + end + 1;
                continue;
            }

            if let Some(after) = rest.strip_prefix("</") {
                let end = after
                    .find('>')
                    .ok_or_else(|| Error::UnexpectedEof("closing tag".to_string()))?;
                self.pos += 2 + end + 1;
                return Ok(Some(Event::End(after[..end].trim())));
            }

            if let Some(after) = rest.strip_prefix('<') {
                let end = after
                    .find('>')
                    .ok_or_else(|| Error::UnexpectedEof("opening tag".to_string()))?;
                self.pos += 1 + end + 1;

                let body = &after[..end];
                let (body, empty) = match body.strip_suffix('/') {
                    Some(body) => (body, true),
                    None => (body, false),
                };
                let name = body.split(char::is_whitespace).next().unwrap_or_default();
                if name.is_empty() {
                    return Err(Error::InvalidMessage("tag without a name".to_string()));
                }

                return Ok(Some(if empty {
                    Event::Empty(name)
                } else {
                    Event::Start(name)
                }));
            }

            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            return Ok(Some(Event::Text(unescape(&rest[..end])?.into_owned())));
        }
    }
}

/// Escape character data for inclusion in an element body.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Resolve the predefined entities and numeric character references.
pub(crate) fn unescape(raw: &str) -> Result<Cow<'_, str>, Error> {
    if !raw.contains('&') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| Error::InvalidMessage("unterminated entity reference".to_string()))?;
        let entity = &after[..semi];

        let resolved = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    Error::InvalidMessage(format!("unknown entity &{};", entity))
                })?
            }
        };

        out.push(resolved);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);

    Ok(Cow::Owned(out))
}
