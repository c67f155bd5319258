use super::*;
use crate::codec::{decode_vec, encode_vec, CodecError, Cursor, Decode, Encode, VecSize};

impl Encode for CipherSuiteName {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        (*self as u16).encode(buffer)
    }
}

impl Decode for CipherSuiteName {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        CipherSuiteName::try_from(u16::decode(cursor)?)
    }
}

impl Encode for HpkePublicKey {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_vec(VecSize::VecU16, buffer, &self.value)
    }
}

impl Decode for HpkePublicKey {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(HpkePublicKey {
            value: decode_vec(VecSize::VecU16, cursor)?,
        })
    }
}

impl Encode for HpkePrivateKey {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_vec(VecSize::VecU16, buffer, &self.value)
    }
}

impl Decode for HpkePrivateKey {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(HpkePrivateKey {
            value: decode_vec(VecSize::VecU16, cursor)?,
        })
    }
}

impl Encode for HpkeCiphertext {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_vec(VecSize::VecU16, buffer, &self.kem_output)?;
        encode_vec(VecSize::VecU16, buffer, &self.ciphertext)
    }
}

impl Decode for HpkeCiphertext {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let kem_output = decode_vec(VecSize::VecU16, cursor)?;
        let ciphertext = decode_vec(VecSize::VecU16, cursor)?;
        Ok(HpkeCiphertext {
            kem_output,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hpke_ciphertext_round_trip() {
        let ct = HpkeCiphertext {
            kem_output: vec![0x01, 0x02, 0x03],
            ciphertext: vec![0x04, 0x05],
        };
        let bytes = ct.encode_detached().unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x03, 0x01, 0x02, 0x03, 0x00, 0x02, 0x04, 0x05]
        );
        assert_eq!(HpkeCiphertext::decode_detached(&bytes).unwrap(), ct);
    }

    #[test]
    fn unknown_suite_name_rejected() {
        assert_eq!(
            CipherSuiteName::decode_detached(&[0x00, 0x09]),
            Err(CodecError::DecodingError)
        );
    }
}
