//! Record renderers.
//!
//! Both built-in formatters terminate each record with a newline. Caller
//! fields iterate in key order, so output is deterministic for a given
//! record.

use crate::record::Record;
use crate::value::{display, Value};
use std::error::Error;

/// Strategy that renders a [`Record`] into bytes.
///
/// Implementations must not rely on anything but the record itself.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;
}

/// Flat JSON object: caller fields plus the reserved `level`, `msg` and,
/// unless disabled, `time` keys. Reserved keys overwrite caller fields with
/// the same name.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter {
    with_time: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter { with_time: true }
    }

    pub fn without_time() -> Self {
        JsonFormatter { with_time: false }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        let mut object: serde_json::Map<String, Value> = record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if self.with_time {
            object.insert("time".to_string(), Value::String(record.time_rfc3339()));
        }
        object.insert("level".to_string(), Value::String(record.level.to_string()));
        object.insert("msg".to_string(), Value::String(record.message()));

        let mut out = serde_json::to_vec(&object)?;
        out.push(b'\n');
        Ok(out)
    }
}

/// Human-readable `Level="INFO" Msg="..." key="value"` line, optionally
/// prefixed with `Time="..."`.
#[derive(Debug, Clone, Copy)]
pub struct LineFormatter {
    with_time: bool,
}

impl LineFormatter {
    pub fn new() -> Self {
        LineFormatter { with_time: true }
    }

    pub fn without_time() -> Self {
        LineFormatter { with_time: false }
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        let mut line = String::new();
        if self.with_time {
            push_pair(&mut line, "Time", &record.time_rfc3339());
            line.push(' ');
        }
        push_pair(&mut line, "Level", record.level.as_str());
        line.push(' ');
        push_pair(&mut line, "Msg", &record.message());
        for (key, value) in record.fields {
            line.push(' ');
            push_pair(&mut line, key, &display(value));
        }
        line.push('\n');
        Ok(line.into_bytes())
    }
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    line.push_str(key);
    line.push_str("=\"");
    for c in value.chars() {
        match c {
            '"' => line.push_str("\\\""),
            '\\' => line.push_str("\\\\"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            c => line.push(c),
        }
    }
    line.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::level::Level;
    use crate::record::FieldSet;
    use chrono::{TimeZone, Utc};

    fn fixed<'a>(fields: &'a FieldSet, template: &'a str, args: &'a [Value]) -> Record<'a> {
        let mut record = Record::new(Level::Info, fields, template, args);
        record.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        record
    }

    fn render(f: &dyn Formatter, record: &Record<'_>) -> String {
        String::from_utf8(f.format(record).unwrap()).unwrap()
    }

    #[test]
    fn line_without_fields_has_no_trailing_tokens() {
        let fields = FieldSet::new();
        let args = args!["world"];
        let record = fixed(&fields, "hello %s", &args);
        assert_eq!(render(&LineFormatter::without_time(), &record), "Level=\"INFO\" Msg=\"hello world\"\n");
    }

    #[test]
    fn line_with_time_and_fields() {
        let mut fields = FieldSet::new();
        fields.insert("user".into(), Value::from("bob"));
        fields.insert("attempt".into(), Value::from(3));
        let record = fixed(&fields, "login", &[]);
        assert_eq!(
            render(&LineFormatter::new(), &record),
            "Time=\"2024-03-01T12:30:05Z\" Level=\"INFO\" Msg=\"login\" attempt=\"3\" user=\"bob\"\n"
        );
    }

    #[test]
    fn line_escapes_quotes_and_newlines() {
        let mut fields = FieldSet::new();
        fields.insert("q".into(), Value::from("say \"hi\"\nbye"));
        let record = fixed(&fields, "m", &[]);
        assert_eq!(
            render(&LineFormatter::without_time(), &record),
            "Level=\"INFO\" Msg=\"m\" q=\"say \\\"hi\\\"\\nbye\"\n"
        );
    }

    #[test]
    fn json_contains_fields_and_reserved_keys() {
        let mut fields = FieldSet::new();
        fields.insert("count".into(), Value::from(2));
        let args = args!["disk", 5];
        let record = fixed(&fields, "error %s: %d", &args);
        let out = render(&JsonFormatter::new(), &record);
        assert!(out.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "count": 2,
                "level": "INFO",
                "msg": "error disk: 5",
                "time": "2024-03-01T12:30:05Z",
            })
        );
    }

    #[test]
    fn json_without_time_omits_the_key() {
        let fields = FieldSet::new();
        let record = fixed(&fields, "m", &[]);
        assert_eq!(render(&JsonFormatter::without_time(), &record), "{\"level\":\"INFO\",\"msg\":\"m\"}\n");
    }

    #[test]
    fn reserved_keys_overwrite_colliding_fields() {
        let mut fields = FieldSet::new();
        fields.insert("level".into(), Value::from("spoofed"));
        fields.insert("msg".into(), Value::from("spoofed"));
        fields.insert("time".into(), Value::from("spoofed"));
        let record = fixed(&fields, "real", &[]);

        let parsed: serde_json::Value =
            serde_json::from_str(&render(&JsonFormatter::new(), &record)).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["msg"], "real");
        assert_eq!(parsed["time"], "2024-03-01T12:30:05Z");

        // Line tokens are capitalised, so lowercase caller fields stay visible.
        let line = render(&LineFormatter::without_time(), &record);
        assert!(line.starts_with("Level=\"INFO\" Msg=\"real\""));
        assert!(line.contains(" level=\"spoofed\""));
    }

    #[test]
    fn message_is_identical_across_formatters() {
        let fields = FieldSet::new();
        let args = args!["disk", 5];
        let record = fixed(&fields, "error %s: %d", &args);
        let expected = crate::value::render_message("error %s: %d", &args);

        let parsed: serde_json::Value =
            serde_json::from_str(&render(&JsonFormatter::without_time(), &record)).unwrap();
        assert_eq!(parsed["msg"], expected.as_str());
        assert!(render(&LineFormatter::without_time(), &record).contains(&format!("Msg=\"{expected}\"")));
    }
}
