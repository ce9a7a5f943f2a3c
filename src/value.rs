//! Opaque values carried in fields and message arguments, and the
//! printf-style substitution used to render messages.

use serde_json::Number;
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

/// Opaque value type used for fields and message arguments.
pub use serde_json::Value;

/// Build a fixed-size array of [`Value`]s from heterogeneous expressions.
///
/// ```
/// use fieldlog::{args, Value};
///
/// let a = args!["disk", 5];
/// assert_eq!(a, [Value::from("disk"), Value::from(5)]);
/// ```
#[macro_export]
macro_rules! args {
    () => {{
        let empty: [$crate::Value; 0] = [];
        empty
    }};
    ($($arg:expr),+ $(,)?) => {
        [$($crate::Value::from($arg)),+]
    };
}

/// Substitute `args` into `template` using Go-style positional verbs.
///
/// Supported verbs are `%v %s %d %q %t %f %x %X` and the `%%` escape. A verb
/// may carry the flags `- + # 0` and space, a width and a `.precision`, e.g.
/// `%-8s`, `%05d` or `%.2f`.
pub fn render_message(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut next_arg = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let spec = parse_spec(&mut chars);
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        match next_arg.next() {
            Some(arg) => match write_verb(verb, &spec, arg) {
                Some(piece) => piece.pad_into(&mut out, &spec),
                None => bad_verb(&mut out, verb, arg),
            },
            None => {
                let _ = write!(out, "%!{verb}(MISSING)");
            }
        }
    }

    let extra: Vec<String> = next_arg.map(display).collect();
    if !extra.is_empty() {
        let _ = write!(out, "%!(EXTRA {})", extra.join(", "));
    }
    out
}

/// Plain rendering of a value: strings unquoted, `null` as `<nil>`, the rest
/// as JSON text.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "<nil>".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    sharp: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Spec {
    let mut spec = Spec::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.minus = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '#' => spec.sharp = true,
            '0' => spec.zero = true,
            _ => break,
        }
        chars.next();
    }
    spec.width = parse_number(chars);
    if chars.next_if_eq(&'.').is_some() {
        spec.precision = Some(parse_number(chars).unwrap_or(0));
    }
    spec
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some(digit) = chars.next_if(char::is_ascii_digit).and_then(|c| c.to_digit(10)) {
        number = Some(number.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
    }
    number
}

/// One formatted argument before width padding. Zero padding goes between
/// `prefix` (sign, `0x`) and `body`.
struct Piece {
    prefix: String,
    body: String,
    zero_pad: bool,
}

impl Piece {
    fn text(body: String) -> Self {
        Piece { prefix: String::new(), body, zero_pad: false }
    }

    fn pad_into(self, out: &mut String, spec: &Spec) {
        let len = self.prefix.chars().count() + self.body.chars().count();
        let fill = spec.width.unwrap_or(0).saturating_sub(len);
        if spec.minus {
            out.push_str(&self.prefix);
            out.push_str(&self.body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if spec.zero && self.zero_pad {
            out.push_str(&self.prefix);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(&self.body);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(&self.prefix);
            out.push_str(&self.body);
        }
    }
}

fn sign(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn integer(n: &Number, verb: char, spec: &Spec) -> Option<Piece> {
    let (negative, abs) = match n.as_u64() {
        Some(u) => (false, u),
        None => {
            let i = n.as_i64()?;
            (i < 0, i.unsigned_abs())
        }
    };
    let mut body = match verb {
        'x' => format!("{abs:x}"),
        'X' => format!("{abs:X}"),
        _ => abs.to_string(),
    };
    if let Some(min_digits) = spec.precision {
        if body.len() < min_digits {
            body.insert_str(0, &"0".repeat(min_digits - body.len()));
        }
    }
    let mut prefix = sign(negative, spec).to_string();
    if spec.sharp {
        match verb {
            'x' => prefix.push_str("0x"),
            'X' => prefix.push_str("0X"),
            _ => {}
        }
    }
    Some(Piece { prefix, body, zero_pad: spec.precision.is_none() })
}

fn float(f: f64, spec: &Spec) -> Piece {
    Piece {
        prefix: sign(f < 0.0, spec).to_string(),
        body: format!("{:.*}", spec.precision.unwrap_or(6), f.abs()),
        zero_pad: true,
    }
}

fn truncated(text: String, spec: &Spec) -> String {
    match spec.precision {
        Some(max) => text.chars().take(max).collect(),
        None => text,
    }
}

fn write_verb(verb: char, spec: &Spec, arg: &Value) -> Option<Piece> {
    match (verb, arg) {
        // `%+v` is the struct-field form in Go; it never forces a sign.
        ('v', Value::Number(n)) if n.is_i64() || n.is_u64() => {
            integer(n, 'd', &Spec { plus: false, ..*spec })
        }
        ('v' | 's', _) => Some(Piece::text(truncated(display(arg), spec))),
        ('d', Value::Number(n)) => integer(n, verb, spec),
        ('q', Value::String(_)) => Some(Piece::text(arg.to_string())),
        ('q', other) => Some(Piece::text(format!("\"{}\"", display(other)))),
        ('t', Value::Bool(b)) => Some(Piece::text(b.to_string())),
        ('f', Value::Number(n)) => n.as_f64().map(|f| float(f, spec)),
        ('x' | 'X', Value::Number(n)) => integer(n, verb, spec),
        ('x' | 'X', Value::String(s)) => {
            let mut body = if spec.sharp { String::from("0x") } else { String::new() };
            for b in truncated(s.clone(), spec).bytes() {
                let _ = if verb == 'x' { write!(body, "{b:02x}") } else { write!(body, "{b:02X}") };
            }
            Some(Piece::text(body))
        }
        _ => None,
    }
}

fn bad_verb(out: &mut String, verb: char, arg: &Value) {
    let _ = write!(out, "%!{verb}({})", display(arg));
}
