#![no_main]

use libfuzzer_sys::fuzz_target;
use libutils::rle::RleCodec;
use libutils::UtilError;

mod common;
use common::{reference_compress, FuzzInput};

fuzz_target!(|data: FuzzInput| {
    let input = &data.data;
    let codec = RleCodec::new();
    let expected = reference_compress(input);

    let Some(buffer_len) = data.mode.compress_buffer_len(input.len()) else {
        let restored = codec
            .decompress_to_vec(&expected)
            .expect("If we can compress it, we can decompress it");
        assert_eq!(&restored, input, "Roundtrip mismatch");
        return;
    };

    let mut buffer = vec![0u8; buffer_len];
    match codec.compress(input, Some(&mut buffer)) {
        Ok(compressed) => {
            assert_eq!(&*compressed, &expected[..], "Static and dynamic output differ");
            let mut restored = vec![0u8; input.len()];
            let restored = codec
                .decompress(&compressed, Some(&mut restored))
                .expect("If we can compress it, we can decompress it");
            assert_eq!(&*restored, &input[..], "Roundtrip mismatch");
        }
        // Only a buffer smaller than the exact encoding may fail
        Err(UtilError::Aborted(_) | UtilError::BufferTooSmall { .. }) => {
            assert!(buffer_len < expected.len(), "Failed with room to spare");
        }
        Err(e) => panic!("Unexpected error {e:?} for {data:?}"),
    }
});
