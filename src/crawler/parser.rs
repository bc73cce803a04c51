//! HTML extraction helpers
//!
//! This module turns raw response bytes into a traversable document and pulls
//! out the two things the archive crawler needs:
//! - Hyperlinks (raw `href` values, in document order)
//! - Main body text
//!
//! Archive pages are frequently served in legacy Cyrillic code pages without a
//! usable charset header, so decoding sniffs the byte content instead of
//! trusting the transport.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use scraper::{ElementRef, Html, Selector};

/// Decodes raw page bytes to UTF-8
///
/// Order of precedence: byte order mark, then `chardetng` detection.
/// Undecodable sequences are replaced rather than rejected.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Parses raw bytes into an HTML document
pub fn parse_document(bytes: &[u8]) -> Html {
    Html::parse_document(&decode_bytes(bytes))
}

/// Extracts the `href` of every `<a>` element
///
/// Values are returned as written in the page: relative links are not
/// resolved, since the archive builds absolute addresses by concatenation.
pub fn links_in(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the main text of a document
///
/// Archive books are preformatted, so the text of all `<pre>` blocks is
/// preferred. Pages without any fall back to the text of `<body>`.
/// Trailing whitespace is stripped from every line.
pub fn body_text(document: &Html) -> String {
    let pre_blocks: Vec<String> = Selector::parse("pre")
        .map(|selector| document.select(&selector).map(element_text).collect())
        .unwrap_or_default();

    let raw = if pre_blocks.iter().any(|block| !block.trim().is_empty()) {
        pre_blocks.join("\n")
    } else {
        Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next().map(element_text))
            .unwrap_or_default()
    };

    raw.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}
