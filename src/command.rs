//! The command set understood by the display driver, as sent by a control plane.
//!
//! On the wire a command is an `application/x-www-form-urlencoded` string with up to three
//! fields:
//!
//! * `text`: what to show. Defaults to nothing, which blanks the display.
//! * `interval`: seconds between scroll steps. If present and non-empty the text scrolls,
//!   otherwise it is shown statically.
//! * `times`: how many times to scroll the text through before scrolling it off. Scrolls
//!   forever if absent. Ignored for static text.
//!
//! Any other fields are ignored. If a field appears more than once the first one counts.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::display::driver::{Handle, Request};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show text statically, cropped to the display.
    SetText(String),
    /// Scroll text through the display one column every `interval`, `repeat` times over or until
    /// superseded if `None`.
    SetScroll {
        text: String,
        interval: Duration,
        repeat: Option<NonZeroU32>,
    },
}

/// Reasons a command string is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed percent escape in {0:?}")]
    BadEscape(String),
    #[error("field is not valid UTF-8")]
    NotUtf8,
    #[error("interval {0:?} is not a positive number of seconds")]
    BadInterval(String),
    #[error("times {0:?} is not a positive whole number")]
    BadTimes(String),
}

impl Command {
    /// Parse a command from the query string (or form body) of a request.
    pub fn from_query(query: &str) -> Result<Self, ParseError> {
        let mut text = None;
        let mut interval = None;
        let mut times = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.find('=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, ""),
            };
            let field = match decode(key)?.as_str() {
                "text" => &mut text,
                "interval" => &mut interval,
                "times" => &mut times,
                _ => continue,
            };
            if field.is_none() {
                *field = Some(decode(value)?);
            }
        }

        let text = text.unwrap_or_default();
        match interval.filter(|i| !i.is_empty()) {
            None => Ok(Command::SetText(text)),
            Some(interval) => Ok(Command::SetScroll {
                text,
                interval: parse_interval(&interval)?,
                repeat: match times.filter(|t| !t.is_empty()) {
                    Some(times) => Some(parse_times(&times)?),
                    None => None,
                },
            }),
        }
    }

    /// Hand the command to a running driver.
    pub fn send(self, driver: &Handle) {
        driver.submit(self.into())
    }
}

impl From<Command> for Request {
    fn from(command: Command) -> Request {
        match command {
            Command::SetText(text) => Request::text(text),
            Command::SetScroll {
                text,
                interval,
                repeat,
            } => Request::scroll(text, interval, repeat),
        }
    }
}

fn parse_interval(value: &str) -> Result<Duration, ParseError> {
    let bad = || ParseError::BadInterval(value.to_owned());
    let secs: f64 = value.trim().parse().map_err(|_| bad())?;
    if !(secs > 0.0) {
        return Err(bad());
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if interval > Duration::ZERO => Ok(interval),
        _ => Err(bad()),
    }
}

fn parse_times(value: &str) -> Result<NonZeroU32, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::BadTimes(value.to_owned()))
}

/// Undo form encoding: `+` is a space and `%XX` a byte.
fn decode(field: &str) -> Result<String, ParseError> {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let byte = bytes
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| ParseError::BadEscape(field.to_owned()))?;
                out.push(byte);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| ParseError::NotUtf8)
}
