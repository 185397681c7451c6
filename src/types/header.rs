use serde::{Deserialize, Serialize};
use std::fmt;

/// A single header value as found after `H key:` in the log preamble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<HeaderValue>),
}

impl HeaderValue {
    /// Parse a raw header value.
    ///
    /// Comma-separated values become a list only when every item is numeric,
    /// so free text such as craft names or field-name lists stays intact.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains(',') {
            let items: Vec<HeaderValue> = raw.split(',').map(parse_scalar).collect();
            if items.iter().all(HeaderValue::is_numeric) {
                return HeaderValue::List(items);
            }
            return HeaderValue::Text(raw.to_string());
        }
        parse_scalar(raw)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, HeaderValue::Int(_) | HeaderValue::Float(_))
    }

    /// True for values rendered as nothing (empty text or empty list)
    pub fn is_empty(&self) -> bool {
        match self {
            HeaderValue::Text(s) => s.is_empty(),
            HeaderValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Integer view of the value; lists read their first element
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(v) => Some(*v),
            HeaderValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            HeaderValue::Float(_) => None,
            HeaderValue::Text(s) => s.trim().parse().ok(),
            HeaderValue::List(items) => items.first().and_then(HeaderValue::as_i64),
        }
    }
}

fn parse_scalar(raw: &str) -> HeaderValue {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return HeaderValue::Int(v);
    }
    let looks_numeric = raw
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
        .unwrap_or(false);
    if looks_numeric {
        if let Ok(v) = raw.parse::<f64>() {
            return HeaderValue::Float(v);
        }
    }
    HeaderValue::Text(raw.to_string())
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Int(v) => write!(f, "{}", v),
            HeaderValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            HeaderValue::Float(v) => write!(f, "{}", v),
            HeaderValue::Text(s) => f.write_str(s),
            HeaderValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Insertion-ordered header map.
///
/// Header order is preserved because the classifier renders lines in the
/// order the flight controller wrote them. A repeated key keeps its first
/// position and takes the latest value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: HeaderValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Integer value for `key`, `None` when missing or non-numeric
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(HeaderValue::as_i64)
    }

    /// Rendered value for `key`, empty when missing
    pub fn get_string(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, HeaderValue)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, HeaderValue)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_list() {
        let value = HeaderValue::parse("45,80,40");
        assert_eq!(
            value,
            HeaderValue::List(vec![
                HeaderValue::Int(45),
                HeaderValue::Int(80),
                HeaderValue::Int(40)
            ])
        );
        assert_eq!(value.to_string(), "45,80,40");
        assert_eq!(value.as_i64(), Some(45));
    }

    #[test]
    fn test_text_with_commas_stays_text() {
        let value = HeaderValue::parse("loopIteration,time,axisP[0]");
        assert_eq!(value.to_string(), "loopIteration,time,axisP[0]");
        assert_eq!(value.as_i64(), None);
    }

    #[test]
    fn test_float_display_keeps_decimal() {
        assert_eq!(HeaderValue::parse("1.0").to_string(), "1.0");
        assert_eq!(HeaderValue::parse("0.25").to_string(), "0.25");
    }

    #[test]
    fn test_hex_and_words_are_text() {
        assert_eq!(
            HeaderValue::parse("0x3f800000"),
            HeaderValue::Text("0x3f800000".to_string())
        );
        assert_eq!(
            HeaderValue::parse("Betaflight 4.5.1 (77d01ba3b) STM32F7X2"),
            HeaderValue::Text("Betaflight 4.5.1 (77d01ba3b) STM32F7X2".to_string())
        );
    }

    #[test]
    fn test_map_keeps_first_position() {
        let mut map = HeaderMap::new();
        map.insert("looptime", HeaderValue::Int(125));
        map.insert("pid_process_denom", HeaderValue::Int(2));
        map.insert("looptime", HeaderValue::Int(250));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["looptime", "pid_process_denom"]);
        assert_eq!(map.get_i64("looptime"), Some(250));
        assert_eq!(map.get_i64("missing"), None);
    }
}
