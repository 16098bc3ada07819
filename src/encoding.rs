//! Deterministic binary encoding of stored records, built on `ed`.
//!
//! Fixed-width fields encode big-endian so encoded keys sort the same way as
//! the values they represent. Variable-length text carries a `u16` length
//! prefix so it may appear anywhere within a record.

pub use ed::*;

/// Number of bytes `encode_text` writes for `text`.
pub fn text_length(text: &str) -> ed::Result<usize> {
    Ok(text.len() + 2)
}

/// Writes `text` as a `u16` byte length followed by its UTF-8 bytes.
pub fn encode_text<W: std::io::Write>(text: &str, dest: &mut W) -> ed::Result<()> {
    let len: u16 = text
        .len()
        .try_into()
        .map_err(|_| ed::Error::UnexpectedByte(0))?;

    dest.write_all(&len.encode()?)?;
    dest.write_all(text.as_bytes())?;

    Ok(())
}

/// Reads text written by `encode_text`.
pub fn decode_text<R: std::io::Read>(mut reader: R) -> ed::Result<String> {
    let len = u16::decode(&mut reader)?;
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;

    String::from_utf8(bytes).map_err(|_| ed::Error::UnexpectedByte(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text() {
        let mut bytes = vec![];
        encode_text("moniker", &mut bytes).unwrap();
        encode_text("", &mut bytes).unwrap();
        assert_eq!(bytes.len(), text_length("moniker").unwrap() + 2);
        assert_eq!(&bytes[..2], &[0, 7]);

        let mut reader = bytes.as_slice();
        assert_eq!(decode_text(&mut reader).unwrap(), "moniker");
        assert_eq!(decode_text(&mut reader).unwrap(), "");
    }

    #[test]
    fn invalid_utf8() {
        let bytes = [0, 1, 0xff];
        assert!(decode_text(&bytes[..]).is_err());
    }
}
