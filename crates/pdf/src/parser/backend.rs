use std::collections::BTreeMap;

use lopdf::content::Content;

use crate::PdfError;

// ---------------------------------------------------------------------------
// Plain-data view of lopdf values
// ---------------------------------------------------------------------------

/// `(object number, generation)`, as in `lopdf::ObjectId`.
pub type PageId = (u32, u16);

/// A font resource of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FontResource {
    /// Resource key used by `Tf`, e.g. `b"F1"`.
    pub key: Vec<u8>,
    /// `/BaseFont` of the font dictionary, e.g. `"ABCDEF+Arial-BoldMT"`.
    pub base_font: Option<String>,
    /// `/Encoding` when given by name.
    pub encoding: Option<String>,
}

impl FontResource {
    /// The base-font name with any subset tag removed, falling back to the key.
    pub fn display_name(&self) -> String {
        match &self.base_font {
            Some(name) => match name.split_once('+') {
                Some((tag, rest)) if tag.len() == 6 => rest.to_string(),
                _ => name.clone(),
            },
            None => String::from_utf8_lossy(&self.key).into_owned(),
        }
    }
}

/// Operand values the text-state machine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

/// One content-stream operation.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    /// Numeric operand at `index`, if present.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(PdfValue::as_number)
    }
}

pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Decode string bytes without font information.
///
/// UTF-16BE with a byte-order mark, then UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Decode two-byte codes of an `Identity-H`/`Identity-V` font.
///
/// `None` when the bytes do not look like UTF-16 text.
fn decode_identity(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let decoded = String::from_utf16_lossy(&units);
    let garbage = decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0');
    (!garbage).then_some(decoded)
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// What layout analysis needs from a parsed PDF.
pub trait PdfBackend {
    /// 1-based page number to page object id.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError>;

    /// Decoded (decompressed) content stream of a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Turn the bytes of a text-showing operand into text.
    fn decode_text(&self, font: Option<&FontResource>, bytes: &[u8]) -> String {
        let identity = font
            .and_then(|f| f.encoding.as_deref())
            .is_some_and(|e| e.contains("Identity"));
        if identity {
            if let Some(text) = decode_identity(bytes) {
                return text;
            }
        }
        decode_text_simple(bytes)
    }
}

pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        Ok(fonts
            .iter()
            .map(|(key, dict)| FontResource {
                key: key.clone(),
                base_font: name_of(dict, b"BaseFont"),
                encoding: name_of(dict, b"Encoding"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }
}
