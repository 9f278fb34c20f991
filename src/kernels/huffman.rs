//! This module contains the pure, stateless kernel for Huffman entropy coding
//! over the byte alphabet.
//!
//! The tree is stored as a flat arena of nodes referenced by index rather than
//! as boxed child pointers, which keeps ownership simple and makes codebook
//! serialization trivial. The encoded stream is self-decodable: the codebook
//! travels at the front of the blob, followed by the declared symbol count and
//! the padded bitstream, so `decode` needs nothing but the blob itself.

use bitvec::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Cursor;

use super::leb128;
use crate::error::CrunchError;

//==================================================================================
// 1. Tree & Codebook
//==================================================================================

/// One arena slot. Only leaves carry a symbol; internal nodes are unlabeled
/// merges of their children's frequencies.
#[derive(Debug, Clone, Copy)]
struct Node {
    freq: u64,
    symbol: Option<u8>,
    left: Option<u32>,
    right: Option<u32>,
}

/// A Huffman tree over the byte alphabet, stored as a flat node arena.
#[derive(Debug)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: u32,
}

/// A per-symbol code table indexed by byte value. The induced codes are
/// prefix-free; a single-symbol alphabet receives the one-bit code `0`.
pub type Codebook = Vec<Option<BitVec<u8, Msb0>>>;

/// Builds a Huffman tree from the input bytes, or `None` for empty input.
///
/// The two lowest-frequency nodes are merged repeatedly until one remains.
/// Ties are broken by insertion order (symbols ascending, then merge order),
/// so the tree is deterministic for a given input.
pub fn build_tree(input: &[u8]) -> Option<HuffmanTree> {
    if input.is_empty() {
        return None;
    }

    let mut freqs = [0u64; 256];
    for &byte in input {
        freqs[byte as usize] += 1;
    }

    let mut nodes = Vec::new();
    let mut heap = BinaryHeap::new();
    let mut seq: u64 = 0;
    for (symbol, &freq) in freqs.iter().enumerate() {
        if freq == 0 {
            continue;
        }
        let index = nodes.len() as u32;
        nodes.push(Node {
            freq,
            symbol: Some(symbol as u8),
            left: None,
            right: None,
        });
        heap.push(Reverse((freq, seq, index)));
        seq += 1;
    }

    loop {
        match (heap.pop(), heap.pop()) {
            (Some(Reverse((left_freq, _, left))), Some(Reverse((right_freq, _, right)))) => {
                let index = nodes.len() as u32;
                nodes.push(Node {
                    freq: left_freq + right_freq,
                    symbol: None,
                    left: Some(left),
                    right: Some(right),
                });
                heap.push(Reverse((left_freq + right_freq, seq, index)));
                seq += 1;
            }
            (Some(Reverse((_, _, root))), None) => return Some(HuffmanTree { nodes, root }),
            _ => return None,
        }
    }
}

impl HuffmanTree {
    /// Derives the codebook by depth-first traversal, appending `0` for left
    /// edges and `1` for right edges.
    pub fn derive_codebook(&self) -> Codebook {
        let mut codes: Codebook = vec![None; 256];
        let mut stack: Vec<(u32, BitVec<u8, Msb0>)> = vec![(self.root, BitVec::new())];

        while let Some((index, path)) = stack.pop() {
            let node = &self.nodes[index as usize];
            if let Some(symbol) = node.symbol {
                // A lone leaf has an empty path; it still needs one bit.
                let code = if path.is_empty() {
                    bitvec![u8, Msb0; 0]
                } else {
                    path
                };
                codes[symbol as usize] = Some(code);
            } else {
                if let Some(right) = node.right {
                    let mut branch = path.clone();
                    branch.push(true);
                    stack.push((right, branch));
                }
                if let Some(left) = node.left {
                    let mut branch = path;
                    branch.push(false);
                    stack.push((left, branch));
                }
            }
        }
        codes
    }
}

//==================================================================================
// 2. Encode
//==================================================================================

/// Encodes the input into a self-decodable Huffman blob.
///
/// Layout: `leb128 symbol_count`, `leb128 entry_count`, then per codebook
/// entry `symbol, code_len, packed code bits`, then `leb128 bit_len` and the
/// zero-padded bitstream.
pub fn encode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    if input.is_empty() {
        return Ok(());
    }

    let tree = build_tree(input)
        .ok_or_else(|| CrunchError::Internal("tree build failed on non-empty input".to_string()))?;
    let codebook = tree.derive_codebook();

    leb128::encode_one(input.len() as u64, output_buf)?;

    let entries: Vec<(u8, &BitVec<u8, Msb0>)> = codebook
        .iter()
        .enumerate()
        .filter_map(|(symbol, code)| code.as_ref().map(|c| (symbol as u8, c)))
        .collect();
    leb128::encode_one(entries.len() as u64, output_buf)?;

    for (symbol, code) in &entries {
        output_buf.push(*symbol);
        // Depth is bounded by the alphabet size (256 leaves), so the code
        // length always fits a byte.
        output_buf.push(code.len() as u8);
        let mut packed = (*code).clone();
        packed.set_uninitialized(false);
        output_buf.extend_from_slice(packed.as_raw_slice());
    }

    let mut bits: BitVec<u8, Msb0> = BitVec::with_capacity(input.len() * 2);
    for &byte in input {
        let code = codebook[byte as usize].as_ref().ok_or_else(|| {
            CrunchError::Internal(format!("symbol {byte} missing from codebook"))
        })?;
        bits.extend_from_bitslice(code);
    }

    leb128::encode_one(bits.len() as u64, output_buf)?;
    bits.set_uninitialized(false);
    output_buf.extend_from_slice(bits.as_raw_slice());
    Ok(())
}

//==================================================================================
// 3. Decode
//==================================================================================

/// A decode-side trie node, also arena-indexed.
#[derive(Debug, Default, Clone, Copy)]
struct TrieNode {
    symbol: Option<u8>,
    zero: Option<u32>,
    one: Option<u32>,
}

fn read_byte(cursor: &mut Cursor<&[u8]>) -> Result<u8, CrunchError> {
    let pos = cursor.position() as usize;
    let byte = *cursor
        .get_ref()
        .get(pos)
        .ok_or_else(|| CrunchError::HuffmanDecode("Truncated codebook header".to_string()))?;
    cursor.set_position((pos + 1) as u64);
    Ok(byte)
}

/// Decodes a blob produced by [`encode`] back into the original bytes.
pub fn decode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    if input.is_empty() {
        return Ok(());
    }

    let mut cursor = Cursor::new(input);
    let symbol_count = leb128::decode_one::<u64>(&mut cursor)? as usize;
    let entry_count = leb128::decode_one::<u64>(&mut cursor)? as usize;
    if entry_count == 0 || entry_count > 256 {
        return Err(CrunchError::HuffmanDecode(format!(
            "Codebook entry count {entry_count} outside the byte alphabet"
        )));
    }

    // Rebuild the prefix trie from the serialized codebook.
    let mut trie: Vec<TrieNode> = vec![TrieNode::default()];
    for _ in 0..entry_count {
        let symbol = read_byte(&mut cursor)?;
        let code_len = read_byte(&mut cursor)? as usize;
        if code_len == 0 {
            return Err(CrunchError::HuffmanDecode(format!(
                "Zero-length code for symbol {symbol}"
            )));
        }
        let code_bytes = code_len.div_ceil(8);
        let start = cursor.position() as usize;
        let raw = input
            .get(start..start + code_bytes)
            .ok_or_else(|| CrunchError::HuffmanDecode("Truncated codebook entry".to_string()))?;
        cursor.set_position((start + code_bytes) as u64);

        let code = &BitSlice::<u8, Msb0>::from_slice(raw)[..code_len];
        let mut node = 0usize;
        for bit in code {
            if trie[node].symbol.is_some() {
                return Err(CrunchError::HuffmanDecode(
                    "Codebook is not prefix-free".to_string(),
                ));
            }
            let next = if *bit { trie[node].one } else { trie[node].zero };
            node = match next {
                Some(index) => index as usize,
                None => {
                    let index = trie.len() as u32;
                    trie.push(TrieNode::default());
                    if *bit {
                        trie[node].one = Some(index);
                    } else {
                        trie[node].zero = Some(index);
                    }
                    index as usize
                }
            };
        }
        if trie[node].symbol.is_some() {
            return Err(CrunchError::HuffmanDecode(format!(
                "Duplicate code for symbol {symbol}"
            )));
        }
        trie[node].symbol = Some(symbol);
    }

    let bit_len = leb128::decode_one::<u64>(&mut cursor)? as usize;
    let payload = &input[cursor.position() as usize..];
    if payload.len() * 8 < bit_len {
        return Err(CrunchError::HuffmanDecode(
            "Bitstream shorter than its declared length".to_string(),
        ));
    }
    // Every decoded symbol consumes at least one bit, so a declared count
    // beyond the bitstream length cannot be backed by real data.
    if symbol_count > bit_len {
        return Err(CrunchError::HuffmanDecode(format!(
            "Declared symbol count {symbol_count} exceeds the {bit_len}-bit stream"
        )));
    }

    output_buf.reserve(symbol_count);
    let bits = &BitSlice::<u8, Msb0>::from_slice(payload)[..bit_len];
    let mut node = 0usize;
    for bit in bits {
        let next = if *bit { trie[node].one } else { trie[node].zero };
        node = next.ok_or_else(|| {
            CrunchError::HuffmanDecode("Bit sequence reaches no leaf".to_string())
        })? as usize;
        if let Some(symbol) = trie[node].symbol {
            output_buf.push(symbol);
            node = 0;
            if output_buf.len() == symbol_count {
                break;
            }
        }
    }

    if output_buf.len() != symbol_count {
        return Err(CrunchError::HuffmanDecode(format!(
            "Decoded {} symbols, but expected {}",
            output_buf.len(),
            symbol_count
        )));
    }
    Ok(())
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) -> Vec<u8> {
        let mut encoded = Vec::new();
        encode(input, &mut encoded).unwrap();
        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        decoded
    }

    #[test]
    fn test_huffman_roundtrip_text() {
        let input = b"the quick brown fox jumps over the lazy dog";
        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn test_huffman_roundtrip_single_symbol_alphabet() {
        // A lone leaf must receive code "0", not the empty code.
        let input = vec![7u8; 100];
        assert_eq!(roundtrip(&input), input);

        let mut encoded = Vec::new();
        encode(&input, &mut encoded).unwrap();
        // 100 one-bit codes pack into 13 bytes plus a small header.
        assert!(encoded.len() < input.len());
    }

    #[test]
    fn test_huffman_empty_input() {
        assert_eq!(roundtrip(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_huffman_skewed_input_compresses() {
        let mut input = vec![b'a'; 900];
        input.extend_from_slice(&[b'b'; 90]);
        input.extend_from_slice(&[b'c'; 10]);

        let mut encoded = Vec::new();
        encode(&input, &mut encoded).unwrap();
        assert!(encoded.len() < input.len());
        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_huffman_is_deterministic() {
        // Equal frequencies exercise the tie-break; repeated runs must agree.
        let input = b"abcdabcdabcd";
        let mut first = Vec::new();
        encode(input, &mut first).unwrap();
        let mut second = Vec::new();
        encode(input, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_huffman_decode_truncated_bitstream() {
        let input = b"hello hello hello";
        let mut encoded = Vec::new();
        encode(input, &mut encoded).unwrap();
        encoded.truncate(encoded.len() - 2);

        let mut decoded = Vec::new();
        let result = decode(&encoded, &mut decoded);
        assert!(matches!(result, Err(CrunchError::HuffmanDecode(_))));
    }

    #[test]
    fn test_huffman_decode_rejects_overstated_symbol_count() {
        // A hand-built header declaring u64::MAX symbols backed by a one-bit
        // stream must error out instead of reserving for the declared count.
        let mut blob = Vec::new();
        leb128::encode_one(u64::MAX, &mut blob).unwrap();
        leb128::encode_one(1u64, &mut blob).unwrap();
        blob.push(b'a');
        blob.push(1);
        blob.push(0x00);
        leb128::encode_one(1u64, &mut blob).unwrap();
        blob.push(0x00);

        let mut decoded = Vec::new();
        let result = decode(&blob, &mut decoded);
        assert!(matches!(result, Err(CrunchError::HuffmanDecode(_))));
    }

    #[test]
    fn test_huffman_decode_garbage() {
        let garbage = vec![0xFFu8, 0x00, 0x13, 0x37];
        let mut decoded = Vec::new();
        assert!(decode(&garbage, &mut decoded).is_err());
    }

    #[test]
    fn test_codebook_is_prefix_free() {
        let input = b"mississippi river";
        let tree = build_tree(input).unwrap();
        let codebook = tree.derive_codebook();
        let codes: Vec<_> = codebook.iter().flatten().collect();

        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(
                        !b.starts_with(a),
                        "code {:?} is a prefix of {:?}",
                        a,
                        b
                    );
                }
            }
        }
    }
}
