//! S-expression plist helpers shared by the frame and config parsers.

use lexpr::Value;

/// Whether `key` (without colon) names this plist key cell.
fn is_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Keyword(k) => k.as_ref() == key,
        Value::Symbol(s) => s.strip_prefix(':') == Some(key),
        _ => false,
    }
}

/// Raw value following `:key` in a plist.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = value;
    while let Value::Cons(pair) = current {
        if is_key(pair.car(), key) {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Whether a value reads as nil: `nil`, `()`, `#nil` or `#f`.
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null | Value::Bool(false) => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Extract a value as a string: keywords and symbols lose their colon.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    match val {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => Some(v.strip_prefix(':').unwrap_or(&**v).to_string()),
        Value::String(v) => Some(v.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
        Value::Nil | Value::Null => Some("nil".to_string()),
        _ => Some(val.to_string()),
    }
}

/// Numeric value of a number cell.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_value(value, key).and_then(as_number)
}

pub fn get_uint(value: &Value, key: &str) -> Option<u64> {
    match get_value(value, key)? {
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Treats nil-like values as false, anything else as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_value(value, key).map(|v| !is_nil(v))
}

/// Elements of a proper list.  `nil`/`()` is the empty list; anything
/// that is not a list yields None.
pub fn list_items(value: &Value) -> Option<Vec<&Value>> {
    if is_nil(value) {
        return Some(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null | Value::Nil => return Some(items),
            _ => return None,
        }
    }
}

/// Escape a string for embedding in an s-expression.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
