use zio_zstd::{Header, HeaderError, Logical, HEADER_SIZE};
use zio_zstd::header::{decode, encode};

#[test]
fn header_carries_payload_len_version_and_level() {
    let mut buf = [0u8; 32];
    encode(&mut buf, 17, Logical::Fast5);
    let header = decode(&buf).unwrap();
    assert_eq!(
        header,
        Header {
            payload_len: 17,
            version: 1,
            level: Logical::Fast5,
        }
    );
}

#[test]
fn rejects_buffers_shorter_than_header_size() {
    let buf = [0u8; HEADER_SIZE - 1];
    assert_eq!(decode(&buf), Err(HeaderError::Truncated));
}
