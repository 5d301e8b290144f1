//! XML-RPC serialisation: `methodCall` out, `methodResponse` in.
//!
//! Requests are written event by event with `quick_xml::Writer`, which does
//! the escaping. Decoding goes through `roxmltree`, which gives us a
//! read-only tree with entities already resolved.

use super::value::Value;
use crate::error::{Result, UnoError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::io;

type XmlWriter = Writer<Vec<u8>>;

/// Serialise a call to `method` with positional `params`.
///
/// Fails with [`UnoError::InvalidConfig`] when a string contains a character
/// XML 1.0 cannot represent, such as most C0 control characters.
pub fn encode_call(method: &str, params: &[Value]) -> Result<String> {
    if let Some(c) = std::iter::once(method)
        .chain(params.iter().flat_map(texts))
        .flat_map(str::chars)
        .find(|c| !is_xml_char(*c))
    {
        return Err(UnoError::InvalidConfig(format!(
            "Call to '{method}' contains U+{:04X}, which XML-RPC cannot carry",
            u32::from(c)
        )));
    }

    let mut writer = Writer::new(Vec::new());
    write_call(&mut writer, method, params)
        .map_err(|e| UnoError::protocol(method, format!("failed to encode request: {e}")))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| UnoError::protocol(method, format!("failed to encode request: {e}")))
}

fn write_call(w: &mut XmlWriter, method: &str, params: &[Value]) -> io::Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    w.get_mut().push(b'\n');
    open(w, "methodCall")?;
    text_element(w, "methodName", method)?;
    open(w, "params")?;
    for param in params {
        open(w, "param")?;
        write_value(w, param)?;
        close(w, "param")?;
    }
    close(w, "params")?;
    close(w, "methodCall")?;
    w.get_mut().push(b'\n');
    Ok(())
}

fn write_value(w: &mut XmlWriter, value: &Value) -> io::Result<()> {
    open(w, "value")?;
    match value {
        Value::Nil => w.write_event(Event::Empty(BytesStart::new("nil")))?,
        Value::Bool(b) => text_element(w, "boolean", if *b { "1" } else { "0" })?,
        Value::Int(i) => text_element(w, "int", &i.to_string())?,
        Value::Double(d) => text_element(w, "double", &d.to_string())?,
        Value::String(s) => text_element(w, "string", s)?,
        Value::Base64(bytes) => text_element(w, "base64", &STANDARD.encode(bytes))?,
        Value::DateTime(s) => text_element(w, "dateTime.iso8601", s)?,
        Value::Array(items) => {
            open(w, "array")?;
            open(w, "data")?;
            for item in items {
                write_value(w, item)?;
            }
            close(w, "data")?;
            close(w, "array")?;
        }
        Value::Struct(members) => {
            open(w, "struct")?;
            for (name, member) in members {
                open(w, "member")?;
                text_element(w, "name", name)?;
                write_value(w, member)?;
                close(w, "member")?;
            }
            close(w, "struct")?;
        }
    }
    close(w, "value")
}

fn open(w: &mut XmlWriter, tag: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))
}

fn close(w: &mut XmlWriter, tag: &str) -> io::Result<()> {
    w.write_event(Event::End(BytesEnd::new(tag)))
}

fn text_element(w: &mut XmlWriter, tag: &str, text: &str) -> io::Result<()> {
    open(w, tag)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    close(w, tag)
}

/// Every piece of free text inside `value`: strings, dates and member names.
fn texts(value: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match value {
        Value::String(s) | Value::DateTime(s) => Box::new(std::iter::once(s.as_str())),
        Value::Array(items) => Box::new(items.iter().flat_map(texts)),
        Value::Struct(members) => Box::new(
            members
                .iter()
                .flat_map(|(name, v)| std::iter::once(name.as_str()).chain(texts(v))),
        ),
        _ => Box::new(std::iter::empty()),
    }
}

/// The `Char` production of XML 1.0.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Parse a `methodResponse` body returned for `method`.
///
/// A `<fault>` becomes [`UnoError::Fault`]. A response without a parameter
/// decodes as [`Value::Nil`].
pub fn decode_response(method: &str, body: &str) -> Result<Value> {
    let doc = Document::parse(body)
        .map_err(|e| UnoError::protocol(method, format!("invalid XML: {e}")))?;

    let root = doc.root_element();
    if root.tag_name().name() != "methodResponse" {
        return Err(UnoError::protocol(
            method,
            format!("expected <methodResponse>, got <{}>", root.tag_name().name()),
        ));
    }

    let Some(payload) = elements(root).next() else {
        return Err(UnoError::protocol(method, "empty <methodResponse>"));
    };

    match payload.tag_name().name() {
        "params" => {
            let Some(param) = elements(payload).find(|n| n.has_tag_name("param")) else {
                return Ok(Value::Nil);
            };
            let value = child(param, "value")
                .ok_or_else(|| UnoError::protocol(method, "<param> without <value>"))?;
            parse_value(value).map_err(|detail| UnoError::protocol(method, detail))
        }
        "fault" => {
            let value = child(payload, "value")
                .ok_or_else(|| UnoError::protocol(method, "<fault> without <value>"))?;
            let fault = parse_value(value).map_err(|detail| UnoError::protocol(method, detail))?;
            Err(fault_error(method, &fault))
        }
        other => Err(UnoError::protocol(
            method,
            format!("unexpected <{other}> in <methodResponse>"),
        )),
    }
}

fn fault_error(method: &str, fault: &Value) -> UnoError {
    let members = fault.as_struct();
    let code = members
        .and_then(|m| m.get("faultCode"))
        .and_then(|v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })
        .unwrap_or(0);
    let message = members
        .and_then(|m| m.get("faultString"))
        .and_then(Value::as_str)
        .unwrap_or("unknown fault")
        .to_string();

    UnoError::Fault {
        method: method.to_string(),
        code,
        message,
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.has_tag_name(name))
}

fn text_of(node: Node<'_, '_>) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

fn parse_value(node: Node<'_, '_>) -> std::result::Result<Value, String> {
    // A <value> with no type element is an implicit string.
    let Some(typed) = elements(node).next() else {
        return Ok(Value::String(text_of(node)));
    };

    let text = || text_of(typed);
    match typed.tag_name().name() {
        "nil" => Ok(Value::Nil),
        "boolean" => match text().trim() {
            "0" => Ok(Value::Bool(false)),
            "1" => Ok(Value::Bool(true)),
            other => Err(format!("invalid boolean '{other}'")),
        },
        "int" | "i4" => text()
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|e| format!("invalid int: {e}")),
        "double" => text()
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|e| format!("invalid double: {e}")),
        "string" => Ok(Value::String(text())),
        "base64" => {
            let compact: String = text().chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|e| format!("invalid base64: {e}"))
        }
        "dateTime.iso8601" => Ok(Value::DateTime(text().trim().to_string())),
        "array" => {
            let Some(data) = child(typed, "data") else {
                return Ok(Value::Array(Vec::new()));
            };
            elements(data)
                .filter(|n| n.has_tag_name("value"))
                .map(parse_value)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in elements(typed).filter(|n| n.has_tag_name("member")) {
                let name = child(member, "name")
                    .map(text_of)
                    .ok_or("struct <member> without <name>")?;
                let value = child(member, "value").ok_or("struct <member> without <value>")?;
                members.insert(name, parse_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(format!("unsupported value type <{other}>")),
    }
}
