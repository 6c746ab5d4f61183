use encoding_rs::Encoding;
use mailparse::{DispositionType, MailHeaderMap, ParsedContentType, ParsedMail};

use crate::domain::email::{EmailRecord, MISSING_HEADER, UNDECODABLE_BODY};
use crate::error::{MailError, Result};

/// Parse a raw RFC 822 message into an `EmailRecord`.
///
/// Header and body problems degrade to placeholders; only a message that
/// isn't MIME at all is an error.
pub fn decode_message(id: &str, raw_rfc822: &[u8]) -> Result<EmailRecord> {
    let parsed = mailparse::parse_mail(raw_rfc822).map_err(|source| MailError::Parse {
        id: id.to_string(),
        source,
    })?;

    Ok(EmailRecord {
        id: id.to_string(),
        subject: header_text(&parsed, "Subject"),
        sender: header_text(&parsed, "From"),
        date: header_text(&parsed, "Date"),
        body: extract_body(&parsed),
    })
}

fn header_text(parsed: &ParsedMail, key: &str) -> String {
    match parsed.headers.get_first_header(key) {
        Some(h) => decode_mime_words(h.get_value_raw()),
        None => MISSING_HEADER.to_string(),
    }
}

/// Decode a raw header value, joining every encoded-word segment.
/// Bytes outside encoded-words are read as UTF-8 with lossy replacement.
pub fn decode_mime_words(raw: &[u8]) -> String {
    let lossy = String::from_utf8_lossy(raw);
    if lossy.trim().is_empty() {
        return MISSING_HEADER.to_string();
    }

    // mailparse expects a full "Key: value" header line
    let mut line = b"X: ".to_vec();
    line.extend_from_slice(lossy.as_bytes());
    line.extend_from_slice(b"\r\n");

    match mailparse::parse_header(&line) {
        Ok((h, _idx)) => h.get_value_utf8().unwrap_or_else(|_| lossy.trim().to_string()),
        Err(_) => lossy.trim().to_string(),
    }
}

/// First non-attachment text/plain part wins; everything after it is ignored,
/// including HTML alternatives.
pub fn extract_body(parsed: &ParsedMail) -> String {
    if parsed.ctype.mimetype.starts_with("multipart/") {
        first_plain_text(parsed).unwrap_or_default()
    } else {
        match decode_part(parsed) {
            Ok(body) => body.unwrap_or_default(),
            Err(_) => UNDECODABLE_BODY.to_string(),
        }
    }
}

// Depth-first, container first, same order as a MIME tree walk.
fn first_plain_text(part: &ParsedMail) -> Option<String> {
    if !is_attachment(part) && part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        if let Ok(Some(text)) = decode_part(part) {
            return Some(text);
        }
    }
    part.subparts.iter().find_map(first_plain_text)
}

fn is_attachment(part: &ParsedMail) -> bool {
    matches!(
        part.get_content_disposition().disposition,
        DispositionType::Attachment
    )
}

/// Transfer-decode a leaf and convert it to text. `Ok(None)` for an empty payload.
fn decode_part(part: &ParsedMail) -> Result<Option<String>> {
    let bytes = part.get_body_raw().map_err(MailError::BodyEncoding)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    decode_charset(&bytes, declared_charset(&part.ctype)).map(Some)
}

fn declared_charset(ctype: &ParsedContentType) -> &str {
    match ctype.params.get("charset") {
        Some(cs) => cs.as_str(),
        // mailparse fills in us-ascii when nothing was declared
        None if ctype.charset != "us-ascii" => ctype.charset.as_str(),
        None => "utf-8",
    }
}

fn decode_charset(bytes: &[u8], charset: &str) -> Result<String> {
    let label = charset.trim().trim_matches('"');
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| MailError::UnknownCharset(label.to_string()))?;
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}
