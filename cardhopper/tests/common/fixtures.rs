// fixtures.rs: commonly used identities, blocks and APDUs

use cardhopper::types::CardIdentity;

/// 7-byte UID of an NTAG-like Type 4 tag
pub fn sample_uid() -> Vec<u8> {
    hex::decode("04A1B2C3D4E5F6").unwrap()
}

/// ATS with FSCI=8, TA/TB/TC present
pub fn sample_ats() -> Vec<u8> {
    hex::decode("0578807002").unwrap()
}

pub fn sample_identity() -> CardIdentity {
    CardIdentity::new(sample_uid(), sample_ats())
        .with_sak(0x20)
        .with_atqa([0x44, 0x03])
}

/// SELECT by AID of the NDEF application
pub fn select_ndef_app() -> Vec<u8> {
    hex::decode("00A4040007D276000085010100").unwrap()
}

/// READ BINARY of the first 15 bytes of the selected file
pub fn read_binary_cc() -> Vec<u8> {
    hex::decode("00B000000F").unwrap()
}

/// I-block (block number `bn`, no CID/NAD) carrying `inf`
pub fn i_block(bn: u8, inf: &[u8]) -> Vec<u8> {
    let mut b = vec![0x02 | (bn & 0x01)];
    b.extend_from_slice(inf);
    b
}
