use std::char::REPLACEMENT_CHARACTER;

/// Incremental UTF-8 decoder for chunked response bodies.
///
/// Bytes of a character split across chunk boundaries are held back until
/// the rest arrives. Invalid sequences decode to U+FFFD instead of failing
/// the stream.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut decoded = String::with_capacity(self.pending.len());
        let mut input: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(input) {
                Ok(s) => {
                    decoded.push_str(s);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&input[..valid_up_to]) {
                        decoded.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            decoded.push(REPLACEMENT_CHARACTER);
                            input = &input[valid_up_to + len..];
                        }
                        // Incomplete sequence at the end: wait for the next chunk
                        None => {
                            input = &input[valid_up_to..];
                            break;
                        }
                    }
                }
            }
        }

        let rest = input.to_vec();
        self.pending = rest;
        decoded
    }

    /// Flushes bytes still held back when the stream ends.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}
