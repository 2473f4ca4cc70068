use thiserror::Error;

// The 2-bit encoding used by the molecule archive:
// A=00, C=01, G=10, T=11, first base in the highest bits.
//
// 12bp UMI => 24 bits needed
// 16bp UMI => 32 bits needed
// u64 covers UMIs up to 32bp

const NT_REVERSE: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UmiCodecError {
    #[error("cannot encode base '{0}', expected one of A/C/G/T")]
    Encode(char),
    #[error("encoded value {value} does not fit a {length}bp UMI")]
    Decode { value: u64, length: usize },
}

#[inline]
fn encode_base(b: u8) -> Result<u64, UmiCodecError> {
    match b {
        b'A' => Ok(0b00),
        b'C' => Ok(0b01),
        b'G' => Ok(0b10),
        b'T' => Ok(0b11),
        other => Err(UmiCodecError::Encode(other as char)),
    }
}

////////////////
/// Encode a UMI sequence in compact 2-bit form
pub fn encode(seq: &[u8]) -> Result<u64, UmiCodecError> {
    debug_assert!(seq.len() <= 32);

    let mut encoded: u64 = 0;
    for &b in seq {
        encoded = (encoded << 2) | encode_base(b)?;
    }
    Ok(encoded)
}

////////////////
/// Get the UMI sequence back from its encoded form
pub fn decode(value: u64, length: usize) -> Result<String, UmiCodecError> {
    //The unpadded bit-length must fit 2 bits per base
    let bits = 64 - value.leading_zeros() as usize;
    if bits > 2 * length {
        return Err(UmiCodecError::Decode { value, length });
    }

    let mut sequence = Vec::with_capacity(length);
    let mut temp = value;
    for _ in 0..length {
        let nuc = (temp & 0b11) as usize;
        sequence.push(NT_REVERSE[nuc]);
        temp >>= 2;
    }
    sequence.reverse();
    Ok(String::from_utf8(sequence).unwrap()) //NT_REVERSE only holds ASCII
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_acgt() {
        let e = encode(b"ACGT").unwrap();

        println!("{}", e);

        //00 01 10 11
        assert_eq!(e, 0b00011011);
    }

    #[test]
    fn roundtrip_12bp() {
        let seq = "AAACGTACGTAC";
        let e = encode(seq.as_bytes()).unwrap();
        let d = decode(e, seq.len()).unwrap();
        assert_eq!(d, seq);
    }

    #[test]
    fn roundtrip_leading_t() {
        //Highest bits set, no left-padding needed on decode
        let seq = "TTTTGGGGCCCC";
        let e = encode(seq.as_bytes()).unwrap();
        assert_eq!(decode(e, seq.len()).unwrap(), seq);
    }

    #[test]
    fn encode_rejects_n() {
        let e = encode(b"ACGNACGT");
        assert_eq!(e, Err(UmiCodecError::Encode('N')));
    }

    #[test]
    fn decode_rejects_too_large_value() {
        //4bp holds at most 8 bits
        let d = decode(1 << 8, 4);
        assert_eq!(
            d,
            Err(UmiCodecError::Decode {
                value: 1 << 8,
                length: 4
            })
        );

        //but exactly 8 bits is fine
        assert_eq!(decode(0b11111111, 4).unwrap(), "TTTT");
    }

    #[test]
    fn decode_pads_short_values() {
        //value 1 in a 4bp UMI is AAAC after left-padding
        assert_eq!(decode(1, 4).unwrap(), "AAAC");
    }
}
