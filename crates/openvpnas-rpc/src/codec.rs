//! XML-RPC wire codec.
//!
//! Encodes parameterless `methodCall` envelopes and decodes `methodResponse`
//! payloads into [`Value`] trees. A `<fault>` response decodes into
//! [`RpcError::Fault`] carrying the faultCode/faultString members.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::error::{Result, RpcError};
use crate::value::Value;

/// Encodes a call envelope for a procedure that takes no parameters.
pub fn encode_call(method: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>{}</methodName><params/></methodCall>",
        escape(method)
    )
}

/// Decodes a `methodResponse` document into the single response value.
pub fn decode_response(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match next_event(&mut reader)? {
            Event::Start(start) => match start.name().as_ref() {
                b"methodResponse" | b"params" | b"param" => {}
                b"value" => return parse_value(&mut reader),
                b"fault" => return Err(parse_fault(&mut reader)),
                other => {
                    return Err(RpcError::InvalidResponse(format!(
                        "unexpected element <{}> in method response",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(start) if start.name().as_ref() == b"params" => {
                return Err(RpcError::InvalidResponse(
                    "response carries no value".to_string(),
                ));
            }
            Event::Eof => {
                return Err(RpcError::InvalidResponse(
                    "response carries no value".to_string(),
                ));
            }
            _ => {}
        }
    }
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    reader
        .read_event()
        .map_err(|err| RpcError::InvalidResponse(format!("malformed xml: {err}")))
}

/// Parses the contents of a `<value>` element, consuming through its end tag.
fn parse_value(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut text: Option<String> = None;
    loop {
        match next_event(reader)? {
            Event::Text(t) => {
                text = Some(
                    t.unescape()
                        .map_err(|err| {
                            RpcError::InvalidResponse(format!("malformed xml text: {err}"))
                        })?
                        .into_owned(),
                );
            }
            Event::Start(start) => {
                let tag = start.name().as_ref().to_vec();
                let parsed = match tag.as_slice() {
                    b"array" => parse_array(reader)?,
                    b"struct" => Value::Struct(parse_struct(reader)?),
                    b"nil" => {
                        read_text(reader, &tag)?;
                        Value::Nil
                    }
                    _ => {
                        let raw = read_text(reader, &tag)?;
                        parse_scalar(&tag, &raw)?
                    }
                };
                consume_to_value_end(reader)?;
                return Ok(parsed);
            }
            Event::Empty(start) => {
                let tag = start.name().as_ref().to_vec();
                let parsed = match tag.as_slice() {
                    b"nil" => Value::Nil,
                    b"array" => Value::Array(Vec::new()),
                    b"struct" => Value::Struct(Vec::new()),
                    _ => parse_scalar(&tag, "")?,
                };
                consume_to_value_end(reader)?;
                return Ok(parsed);
            }
            // Untagged value content is a string per the XML-RPC default.
            Event::End(end) if end.name().as_ref() == b"value" => {
                return Ok(Value::String(text.unwrap_or_default()));
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn parse_scalar(tag: &[u8], raw: &str) -> Result<Value> {
    let raw = raw.trim();
    match tag {
        b"int" | b"i4" | b"i8" => {
            if raw.is_empty() {
                return Ok(Value::Int(0));
            }
            raw.parse::<i64>().map(Value::Int).map_err(|_| {
                RpcError::InvalidResponse(format!("invalid integer value: {raw:?}"))
            })
        }
        b"boolean" => match raw {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" | "" => Ok(Value::Bool(false)),
            _ => Err(RpcError::InvalidResponse(format!(
                "invalid boolean value: {raw:?}"
            ))),
        },
        b"double" => {
            if raw.is_empty() {
                return Ok(Value::Double(0.0));
            }
            raw.parse::<f64>().map(Value::Double).map_err(|_| {
                RpcError::InvalidResponse(format!("invalid double value: {raw:?}"))
            })
        }
        b"string" => Ok(Value::String(raw.to_string())),
        other => Err(RpcError::InvalidResponse(format!(
            "unsupported value type <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Parses `<data><value>...</value>...</data>` after an `<array>` start tag.
fn parse_array(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        match next_event(reader)? {
            Event::Start(start) => match start.name().as_ref() {
                b"data" => {}
                b"value" => items.push(parse_value(reader)?),
                other => {
                    return Err(RpcError::InvalidResponse(format!(
                        "unexpected element <{}> in array",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"data" => {}
                b"value" => items.push(Value::String(String::new())),
                _ => {}
            },
            Event::End(end) if end.name().as_ref() == b"array" => {
                return Ok(Value::Array(items));
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Parses `<member><name>..</name><value>..</value></member>` pairs after a
/// `<struct>` start tag.
fn parse_struct(reader: &mut Reader<&[u8]>) -> Result<Vec<(String, Value)>> {
    let mut members = Vec::new();
    let mut member_name = String::new();
    loop {
        match next_event(reader)? {
            Event::Start(start) => match start.name().as_ref() {
                b"member" => member_name.clear(),
                b"name" => member_name = read_text(reader, b"name")?,
                b"value" => {
                    let value = parse_value(reader)?;
                    members.push((std::mem::take(&mut member_name), value));
                }
                other => {
                    return Err(RpcError::InvalidResponse(format!(
                        "unexpected element <{}> in struct",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(start) if start.name().as_ref() == b"value" => {
                members.push((std::mem::take(&mut member_name), Value::String(String::new())));
            }
            Event::End(end) if end.name().as_ref() == b"struct" => return Ok(members),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Collects character data until the matching end tag.
fn read_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String> {
    let mut out = String::new();
    loop {
        match next_event(reader)? {
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|err| {
                    RpcError::InvalidResponse(format!("malformed xml text: {err}"))
                })?;
                out.push_str(&unescaped);
            }
            Event::CData(data) => out.push_str(&String::from_utf8_lossy(data.as_ref())),
            Event::End(end) if end.name().as_ref() == tag => return Ok(out),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn consume_to_value_end(reader: &mut Reader<&[u8]>) -> Result<()> {
    loop {
        match next_event(reader)? {
            Event::End(end) if end.name().as_ref() == b"value" => return Ok(()),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn parse_fault(reader: &mut Reader<&[u8]>) -> RpcError {
    loop {
        match next_event(reader) {
            Ok(Event::Start(start)) if start.name().as_ref() == b"value" => {
                return match parse_value(reader) {
                    Ok(value) => {
                        let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
                        let message = value
                            .get("faultString")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        RpcError::Fault { code, message }
                    }
                    Err(err) => err,
                };
            }
            Ok(Event::Eof) | Err(_) => {
                return RpcError::InvalidResponse("malformed fault response".to_string());
            }
            Ok(_) => {}
        }
    }
}

fn truncated() -> RpcError {
    RpcError::InvalidResponse("truncated method response".to_string())
}
