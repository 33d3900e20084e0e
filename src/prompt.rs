//! Prompt primitives: single-turn collectors for text, yes/no, numbers and dates.
//!
//! A prompt is issued by sending its text. The user's next reply is run
//! through the matching recognizer; when recognition (or the caller's
//! validator) fails the dialog re-sends the same prompt and stays put.

pub mod datetime;

use crate::activity::OutboundMessage;
use minijinja::Environment;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub use datetime::{DateTimeResolution, recognize_datetime};

/// The kind of value a prompt collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Confirm,
    Number,
    DateTime,
}

/// A prompt: what to ask and how to read the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: &'static str,
}

impl Prompt {
    pub const fn text(text: &'static str) -> Self {
        Self {
            kind: PromptKind::Text,
            text,
        }
    }

    pub const fn confirm(text: &'static str) -> Self {
        Self {
            kind: PromptKind::Confirm,
            text,
        }
    }

    pub const fn number(text: &'static str) -> Self {
        Self {
            kind: PromptKind::Number,
            text,
        }
    }

    pub const fn datetime(text: &'static str) -> Self {
        Self {
            kind: PromptKind::DateTime,
            text,
        }
    }

    /// The outbound message that issues this prompt.
    ///
    /// Confirm prompts list their choices inline.
    pub fn render(&self) -> OutboundMessage {
        match self.kind {
            PromptKind::Confirm => OutboundMessage::text(format!("{} (1) yes or (2) no", self.text)),
            _ => OutboundMessage::text(self.text),
        }
    }
}

fn normalize(reply: &str) -> String {
    reply
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_lowercase()
}

/// Recognizes a yes/no answer.
pub fn recognize_confirm(reply: &str) -> Option<bool> {
    match normalize(reply).as_str() {
        "yes" | "y" | "yeah" | "yep" | "yup" | "sure" | "ok" | "okay" | "1" | "true"
        | "(1) yes" | "yes please" | "of course" => Some(true),
        "no" | "n" | "nope" | "nah" | "2" | "false" | "(2) no" | "no thanks" | "not now" => {
            Some(false)
        }
        _ => None,
    }
}

/// Recognizes free text; blank replies are rejected.
pub fn recognize_text(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Maps an English number word to its value.
pub fn number_word(word: &str) -> Option<i64> {
    let value = match word.to_lowercase().as_str() {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"-?\d+(?:,\d{3})*(?:\.\d+)?").expect("static integer pattern")
    })
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect()
}

fn number_at(words: &[&str]) -> Option<i64> {
    let first = number_word(words.first()?)?;
    let units = words
        .get(1)
        .and_then(|w| number_word(w))
        .filter(|u| (1..=9).contains(u));
    match units {
        Some(units) if first >= 20 && first % 10 == 0 => Some(first + units),
        _ => Some(first),
    }
}

/// Reads a spelled-out number at the very start of `text`.
///
/// A tens word followed by a units word ("twenty five", "thirty-two") is
/// read as one number.
pub fn leading_number_words(text: &str) -> Option<i64> {
    number_at(&words(text))
}

/// Recognizes an integer: the first number in the reply, digits or words.
///
/// Thousands separators are accepted; a decimal such as `2.5` is not an
/// integer and is rejected rather than truncated.
pub fn recognize_number(reply: &str) -> Option<i64> {
    if let Some(m) = integer_pattern().find(reply) {
        let digits = m.as_str();
        if digits.contains('.') {
            return None;
        }
        return digits.replace(',', "").parse().ok();
    }
    let words = words(reply);
    (0..words.len()).find_map(|idx| number_at(&words[idx..]))
}

/// Renders a message from a template string and a serializable context.
pub fn render_prompt<T: Serialize>(template: &str, context: T) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("prompt", template)?;
    let tmpl = env.get_template("prompt")?;
    tmpl.render(context)
}

/// Creates a message string from a template and key-value pairs.
///
/// ```
/// use rambo::prompt;
///
/// let greeting = prompt!("Hi {{ name }}.", name = "Alice").unwrap();
/// assert_eq!(greeting, "Hi Alice.");
/// ```
#[macro_export]
macro_rules! prompt {
    ($template:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::prompt::render_prompt($template, minijinja::context!($($key => $value),*))
    };
}
