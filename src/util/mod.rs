use chrono::{DateTime, SecondsFormat, Utc};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Current UTC time as RFC 3339, the format stored in `PostTimeStamp`.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar date for list views; unparseable timestamps are shown verbatim.
pub(crate) fn display_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp.trim()) {
        Ok(dt) => dt.with_timezone(&Utc).format("%b %-d, %Y").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Extension of an uploaded file name, lower-cased. Falls back to `bin`.
pub(crate) fn file_extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

pub(crate) async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buf = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("could not read {}: {e:?}", file.name()))?;
    let buf = buf
        .dyn_into::<js_sys::ArrayBuffer>()
        .map_err(|_| format!("could not read {}", file.name()))?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}
