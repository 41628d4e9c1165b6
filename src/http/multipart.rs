use std::path::Path;

use mime::Mime;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// A binary file destined for a multipart field.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        filename: impl AsRef<str>,
        content_type: Mime,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            filename: clean_filename(filename.as_ref()),
            content_type,
            bytes,
        }
    }

    /// Load a file from disk, inferring its content type from the extension.
    pub async fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::validation(format!("unable to derive filename from {:?}", path))
            })?;
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ClientError::validation(format!("failed to read {}: {err}", path.display()))
        })?;
        let content_type = content_type_for(filename);
        Ok(Self::new(field, filename, content_type, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn into_part(self) -> Result<Part> {
        Part::bytes(self.bytes)
            .file_name(self.filename)
            .mime_str(self.content_type.as_ref())
            .map_err(|err| ClientError::validation(format!("invalid content type: {err}")))
    }
}

/// Text fields plus file parts, assembled into a reqwest form only at send time.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a JSON object into form fields (see [`form_fields`]).
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self {
            fields: form_fields(value)?,
            files: Vec::new(),
        })
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let field = file.field.clone();
            form = form.part(field, file.into_part()?);
        }
        Ok(form)
    }
}

/// Flatten a JSON object into multipart text fields.
///
/// Arrays become indexed keys (`technologies[0]`, `technologies[1]`), nested objects become
/// bracketed keys, nulls are omitted.
pub fn form_fields(value: &Value) -> Result<Vec<(String, String)>> {
    let Value::Object(map) = value else {
        return Err(ClientError::validation(
            "multipart payload must be a JSON object",
        ));
    };

    let mut out = Vec::new();
    for (key, entry) in map {
        flatten_into(key.clone(), entry, &mut out);
    }
    Ok(out)
}

fn flatten_into(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((key, flag.to_string())),
        Value::Number(number) => out.push((key, number.to_string())),
        Value::String(text) => out.push((key, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{key}[{index}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten_into(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}

/// Map a filename's extension to the content type sent with the part.
pub fn content_type_for(filename: &str) -> Mime {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "webp" => "image/webp"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn clean_filename(original: &str) -> String {
    let sanitized = sanitize_filename::sanitize(original);
    if sanitized.is_empty() {
        "upload.bin".to_string()
    } else {
        sanitized
    }
}
