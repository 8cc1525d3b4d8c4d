use bytes::Bytes;

/// Multipart boundary token. Browsers key off the boundary named in the
/// Content-Type header, so the part framing below must match it exactly.
pub const BOUNDARY: &str = "frame";

/// Content-Type header value for the streaming responses.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Wrap one encoded JPEG in a multipart part.
///
/// Wire layout is fixed: `--frame\r\nContent-Type: image/jpeg\r\n\r\n`,
/// the JPEG bytes, then `\r\n`. MJPEG viewers parse this convention.
pub fn encode_part(jpeg: &[u8]) -> Bytes {
    let mut part = Vec::with_capacity(PART_HEADER.len() + jpeg.len() + 2);
    part.extend_from_slice(PART_HEADER);
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_framing_is_exact() {
        let jpeg = [0xFFu8, 0xD8, 0x01, 0x02, 0xFF, 0xD9];
        let part = encode_part(&jpeg);

        let mut expected = Vec::new();
        expected.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        expected.extend_from_slice(&jpeg);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(&part[..], &expected[..]);
    }

    #[test]
    fn boundary_matches_content_type() {
        assert!(CONTENT_TYPE.ends_with(&format!("boundary={}", BOUNDARY)));
        assert!(encode_part(b"x").starts_with(format!("--{}\r\n", BOUNDARY).as_bytes()));
    }

    #[test]
    fn empty_payload_still_framed() {
        let part = encode_part(&[]);
        assert_eq!(&part[..], b"--frame\r\nContent-Type: image/jpeg\r\n\r\n\r\n");
    }
}
