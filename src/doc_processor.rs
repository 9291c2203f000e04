/// Parsed document content
#[derive(Debug)]
pub struct ParsedDocument {
    pub content: String,
    pub file_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("PDF parse error: {0}")]
    Pdf(String),
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn is_pdf(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Extract plain text from an uploaded document.
///
/// A `.pdf` filename is parsed as PDF with its pages concatenated; anything
/// else is decoded as UTF-8. Empty documents yield empty text.
pub fn parse_bytes(bytes: &[u8], filename: &str) -> Result<ParsedDocument, ExtractError> {
    if is_pdf(filename) {
        let content = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        Ok(ParsedDocument {
            content,
            file_type: "pdf".into(),
        })
    } else {
        let content = String::from_utf8(bytes.to_vec())?;
        Ok(ParsedDocument {
            content,
            file_type: "txt".into(),
        })
    }
}
