//! XML rendering (notifier API v2.3 document).

use nt_redact::ParamsBag;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

use crate::error::SerializationError;
use crate::notice::Notice;

/// Version attribute of the `<notice>` root.
pub const XML_API_VERSION: &str = "2.3";

type XmlResult = Result<(), SerializationError>;

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_text(field: &str, text: &str) -> XmlResult {
    if text.chars().all(is_xml_char) {
        Ok(())
    } else {
        Err(SerializationError::UnrepresentableText {
            field: field.to_string(),
        })
    }
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> XmlResult {
        self.writer
            .write_event(event)
            .map_err(|e| SerializationError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> XmlResult {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(start))
    }

    fn text_element(&mut self, name: &str, field: &str, text: &str) -> XmlResult {
        check_text(field, text)?;
        self.start(name, &[])?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn optional_element(&mut self, name: &str, field: &str, text: Option<&str>) -> XmlResult {
        match text {
            Some(text) => self.text_element(name, field, text),
            None => Ok(()),
        }
    }

    /// A bag as nested `<var key="…">` elements; omitted when empty.
    fn bag(&mut self, name: &str, field: &str, bag: &ParamsBag) -> XmlResult {
        if bag.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        for (key, value) in bag {
            self.var(&format!("{}.{}", field, key), key, value)?;
        }
        self.end(name)
    }

    fn var(&mut self, field: &str, key: &str, value: &Value) -> XmlResult {
        check_text(field, key)?;
        let attrs = [("key", key)];

        match value {
            Value::Null => self.empty("var", &attrs),
            Value::Object(map) => {
                self.start("var", &attrs)?;
                for (child_key, child) in map {
                    self.var(&format!("{}.{}", field, child_key), child_key, child)?;
                }
                self.end("var")
            }
            Value::Array(items) => {
                self.start("var", &attrs)?;
                for (idx, item) in items.iter().enumerate() {
                    self.var(&format!("{}[{}]", field, idx), &idx.to_string(), item)?;
                }
                self.end("var")
            }
            Value::String(text) => self.var_text(field, &attrs, text),
            Value::Bool(b) => self.var_text(field, &attrs, &b.to_string()),
            Value::Number(n) => self.var_text(field, &attrs, &n.to_string()),
        }
    }

    fn var_text(&mut self, field: &str, attrs: &[(&str, &str)], text: &str) -> XmlResult {
        check_text(field, text)?;
        self.start("var", attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end("var")
    }

    fn into_string(self) -> Result<String, SerializationError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| SerializationError::Xml(e.to_string()))
    }
}

/// Render a notice as a notifier API XML document.
pub fn render_xml(notice: &Notice) -> Result<String, SerializationError> {
    let mut out = XmlOut::new();
    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start("notice", &[("version", XML_API_VERSION)])?;

    out.optional_element("api-key", "api_key", notice.api_key())?;

    let notifier = notice.notifier();
    out.start("notifier", &[])?;
    out.text_element("name", "notifier.name", &notifier.name)?;
    out.text_element("version", "notifier.version", &notifier.version)?;
    out.optional_element("url", "notifier.url", notifier.url.as_deref())?;
    out.end("notifier")?;

    write_error(&mut out, notice)?;
    write_request(&mut out, notice)?;

    out.start("server-environment", &[])?;
    out.optional_element(
        "project-root",
        "server_environment.project_root",
        notice.project_root(),
    )?;
    out.text_element(
        "environment-name",
        "server_environment.environment_name",
        notice.environment_name(),
    )?;
    out.optional_element("hostname", "server_environment.hostname", notice.hostname())?;
    out.end("server-environment")?;

    let user = notice.current_user();
    if !user.is_empty() {
        out.start("current-user", &[])?;
        for (key, value) in user.iter() {
            let field = format!("current_user.{}", key);
            match value {
                Value::String(text) => out.text_element(key, &field, text)?,
                other => out.text_element(key, &field, &other.to_string())?,
            }
        }
        out.end("current-user")?;
    }

    out.end("notice")?;
    out.into_string()
}

fn write_error(out: &mut XmlOut, notice: &Notice) -> XmlResult {
    out.start("error", &[])?;
    out.optional_element("class", "error.class", notice.error_class())?;
    out.text_element("message", "error.message", notice.error_message())?;

    if notice.backtrace().is_empty() {
        out.empty("backtrace", &[])?;
    } else {
        out.start("backtrace", &[])?;
        for (idx, frame) in notice.backtrace().iter().enumerate() {
            let field = format!("backtrace[{}]", idx);
            check_text(&field, frame.wire_file())?;
            check_text(&field, frame.wire_method())?;

            let number = frame.line.map(|n| n.to_string());
            let mut attrs = vec![("method", frame.wire_method()), ("file", frame.wire_file())];
            if let Some(number) = number.as_deref() {
                attrs.push(("number", number));
            }
            out.empty("line", &attrs)?;
        }
        out.end("backtrace")?;
    }

    out.end("error")
}

fn write_request(out: &mut XmlOut, notice: &Notice) -> XmlResult {
    let has_request = notice.url().is_some()
        || notice.component().is_some()
        || notice.action().is_some()
        || !notice.parameters().is_empty()
        || !notice.session_data().is_empty()
        || !notice.cgi_data().is_empty();
    if !has_request {
        return Ok(());
    }

    out.start("request", &[])?;
    out.optional_element("url", "request.url", notice.url())?;
    out.optional_element("component", "request.component", notice.component())?;
    out.optional_element("action", "request.action", notice.action())?;
    out.bag("params", "request.params", notice.parameters())?;
    out.bag("session", "request.session", notice.session_data())?;
    out.bag("cgi-data", "request.cgi_data", notice.cgi_data())?;
    out.end("request")
}
