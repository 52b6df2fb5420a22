//! Page text reconstruction from content stream operators
//!
//! Lines break at `T*`, `'`, `"`, vertical `Td`/`TD` moves, a `Tm` that
//! changes the baseline, and `ET`. Strings are decoded through the font's
//! `/ToUnicode` CMap when present, otherwise as WinAnsi single bytes.

use super::pdf::resolve;
use crate::error::Result;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

/// Negative `TJ` adjustment (thousandths of an em) wide enough to read as a word gap
const TJ_SPACE_THRESHOLD: f32 = 250.0;

/// Largest `bfrange` expanded from a ToUnicode CMap
const MAX_CMAP_RANGE: u32 = 0xFFFF;

/// Characters for WinAnsi codes 0x80..=0x9F; the rest of the table matches Latin-1
const WIN_ANSI_HIGH: [char; 32] = [
    '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}', '\u{017D}', '\u{FFFD}',
    '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
];

/// Reconstruct the text of a page's decoded content stream
pub(super) fn extract_text(
    document: &Document,
    content: &[u8],
    resources: Option<&Dictionary>,
) -> Result<String> {
    let fonts = resources
        .map(|resources| load_fonts(document, resources))
        .unwrap_or_default();
    let content = Content::decode(content)?;

    let fallback = FontMap::default();
    let mut font = &fallback;
    let mut writer = TextWriter::default();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => writer.baseline = None,
            "ET" => writer.newline(),
            "Tf" => {
                font = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name))
                    .unwrap_or(&fallback);
            }
            "Td" | "TD" => {
                let tx = number(operands.first());
                let ty = number(operands.get(1));
                if ty != 0.0 {
                    writer.newline();
                } else if tx != 0.0 {
                    writer.space();
                }
            }
            "Tm" => {
                let y = operands.get(5).and_then(|value| value.as_float().ok());
                if writer.baseline.is_some() && y != writer.baseline {
                    writer.newline();
                }
                writer.baseline = y;
            }
            "T*" => writer.newline(),
            "Tj" => writer.show(font, operands.first()),
            "'" => {
                writer.newline();
                writer.show(font, operands.first());
            }
            "\"" => {
                writer.newline();
                writer.show(font, operands.get(2));
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(..) => writer.show(font, Some(item)),
                            other => {
                                if other.as_float().is_ok_and(|gap| -gap >= TJ_SPACE_THRESHOLD) {
                                    writer.space();
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(writer.text)
}

fn number(operand: Option<&Object>) -> f32 {
    operand.and_then(|value| value.as_float().ok()).unwrap_or(0.0)
}

#[derive(Default)]
struct TextWriter {
    text: String,
    baseline: Option<f32>,
}

impl TextWriter {
    fn newline(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn space(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    fn show(&mut self, font: &FontMap, operand: Option<&Object>) {
        if let Some(Object::String(bytes, _)) = operand {
            font.decode_into(bytes, &mut self.text);
        }
    }
}

/// Code-to-text mapping of one font resource
#[derive(Debug, Default)]
struct FontMap {
    two_byte: bool,
    to_unicode: HashMap<u32, String>,
}

impl FontMap {
    fn from_dict(document: &Document, font: &Dictionary) -> Self {
        let two_byte = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|subtype| subtype == b"Type0")
            .unwrap_or(false);

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(document, obj).ok())
            .and_then(|obj| obj.as_stream().ok())
            .map(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                parse_cmap(&data)
            })
            .unwrap_or_default();

        Self {
            two_byte,
            to_unicode,
        }
    }

    fn decode_into(&self, bytes: &[u8], out: &mut String) {
        if self.two_byte {
            for unit in bytes.chunks(2) {
                let code = code_of(unit);
                match self.to_unicode.get(&code) {
                    Some(text) => out.push_str(text),
                    None => out.push(char::from_u32(code).unwrap_or('\u{FFFD}')),
                }
            }
        } else {
            for &byte in bytes {
                match self.to_unicode.get(&u32::from(byte)) {
                    Some(text) => out.push_str(text),
                    None => out.push(win_ansi(byte)),
                }
            }
        }
    }
}

fn load_fonts(document: &Document, resources: &Dictionary) -> HashMap<Vec<u8>, FontMap> {
    let Some(fonts) = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve(document, obj).ok())
        .and_then(|obj| obj.as_dict().ok())
    else {
        return HashMap::new();
    };

    fonts
        .iter()
        .filter_map(|(name, obj)| {
            let font = resolve(document, obj).ok()?.as_dict().ok()?;
            Some((name.clone(), FontMap::from_dict(document, font)))
        })
        .collect()
}

fn win_ansi(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |code, &byte| (code << 8) | u32::from(byte))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| code_of(pair) as u16)
        .collect();
    String::from_utf16_lossy(&units)
}

#[derive(Debug, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

/// Read the `bfchar` and `bfrange` sections of a ToUnicode CMap
fn parse_cmap(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize(data);
    let mut map = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(word) if word == "beginbfchar" => {
                i += 1;
                while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            Token::Word(word) if word == "beginbfrange" => {
                i += 1;
                loop {
                    match (tokens.get(i), tokens.get(i + 1), tokens.get(i + 2)) {
                        (Some(Token::Hex(lo)), Some(Token::Hex(hi)), Some(Token::Hex(dst))) => {
                            let (lo, hi) = (code_of(lo), code_of(hi));
                            let mut units: Vec<u16> =
                                dst.chunks(2).map(|pair| code_of(pair) as u16).collect();
                            for code in lo..=hi.min(lo.saturating_add(MAX_CMAP_RANGE)) {
                                map.insert(code, String::from_utf16_lossy(&units));
                                if let Some(last) = units.last_mut() {
                                    *last = last.wrapping_add(1);
                                }
                            }
                            i += 3;
                        }
                        (Some(Token::Hex(lo)), Some(Token::Hex(hi)), Some(Token::ArrayStart)) => {
                            let (mut code, hi) = (code_of(lo), code_of(hi));
                            i += 3;
                            while let Some(Token::Hex(dst)) = tokens.get(i) {
                                if code <= hi {
                                    map.insert(code, utf16_text(dst));
                                }
                                code = code.saturating_add(1);
                                i += 1;
                            }
                            if tokens.get(i) == Some(&Token::ArrayEnd) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }

    map
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || b"<>[]()/%{}".contains(&byte)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&byte| byte == b'>')
                    .map_or(data.len(), |offset| i + 1 + offset);
                tokens.push(Token::Hex(decode_hex(&data[i + 1..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                while i < data.len() && data[i] != b')' {
                    i += 1;
                }
                i += 1;
            }
            byte if byte.is_ascii_whitespace() || byte == b'>' => i += 1,
            _ => {
                let start = i;
                i += 1;
                while i < data.len() && !is_delimiter(data[i]) {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&digit| (digit as char).to_digit(16).map(|value| value as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
