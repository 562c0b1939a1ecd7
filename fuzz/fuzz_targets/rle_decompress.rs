#![no_main]

use libfuzzer_sys::fuzz_target;
use libutils::rle::{decompressed_len, RleCodec};

fuzz_target!(|data: &[u8]| {
    let codec = RleCodec::new();

    // Keep allocations bounded; the header check runs first either way
    if decompressed_len(data).is_ok_and(|len| len > 1 << 20) {
        return;
    }

    let dynamic = codec.decompress_to_vec(data);
    let mut out = vec![0u8; 1 << 20];
    let fixed = codec.decompress(data, Some(&mut out));

    match (dynamic, fixed) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, &*b, "Static and dynamic output differ");
            assert_eq!(decompressed_len(data), Ok(a.len()));
            // Whatever decodes must re-encode to something that decodes the same
            let recompressed = codec.compress_to_vec(&a).unwrap();
            assert_eq!(codec.decompress_to_vec(&recompressed).unwrap(), a);
        }
        (Err(a), Err(b)) => assert_eq!(a, b, "Modes fail differently"),
        (a, b) => panic!("Modes disagree: {a:?} vs {b:?}"),
    }
});
