use std::path::Path;

use encoding_rs::Encoding;
use tracing::debug;

use crate::errors::LoadError;

// The three single-byte labels all resolve to windows-1252 under the WHATWG label table.
pub const CANDIDATE_ENCODINGS: [&str; 4] = ["utf-8", "latin1", "iso-8859-1", "cp1252"];

#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    pub encoding: &'static str,
}

// Only a decode failure moves on to the next candidate; parse errors propagate.
pub fn decode_and_parse<T, F>(
    path: &Path,
    bytes: &[u8],
    mut parse: F,
) -> Result<Decoded<T>, LoadError>
where
    F: FnMut(&str) -> Result<T, LoadError>,
{
    for label in CANDIDATE_ENCODINGS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };

        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if had_errors {
            debug!(file = %path.display(), encoding = label, "decode failed, trying next encoding");
            continue;
        }

        let value = parse(&text)?;
        return Ok(Decoded {
            value,
            encoding: label,
        });
    }

    Err(LoadError::Decode {
        path: path.to_path_buf(),
        attempted: CANDIDATE_ENCODINGS.to_vec(),
    })
}
