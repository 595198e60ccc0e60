use compress::zlib::{BlockCompressor, BlockDecompressor, CompressionLevel};
use proptest::prelude::*;

const BLOCK: usize = 64 * 1024;

#[test]
fn zero_block_compresses_well_at_every_level() {
    let block = vec![0u8; BLOCK];
    for level in 1..=9 {
        let level = CompressionLevel::from_numeric(level).expect("valid level");
        let mut compressor = BlockCompressor::new(level);
        let compressed = compressor.compress(&block).expect("compress");
        assert!(compressed.len() < BLOCK / 16, "level {level:?}");
    }
}

proptest! {
    #[test]
    fn blocks_round_trip_through_shared_buffers(
        blocks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..2048), 1..8),
    ) {
        let mut compressor = BlockCompressor::new(CompressionLevel::Default);
        let mut decompressor = BlockDecompressor::new(2048);

        for block in &blocks {
            let compressed = compressor.compress(block).expect("compress").to_vec();
            let restored = decompressor.decompress(&compressed).expect("decompress");
            prop_assert_eq!(restored, block.as_slice());
        }
    }
}
