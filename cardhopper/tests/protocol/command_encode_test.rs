use cardhopper::protocol::Command;

#[test]
fn enter_standalone_matches_vector() {
    let bytes = Command::ENTER_STANDALONE.to_bytes();
    assert_eq!(hex::encode_upper(bytes), "504D336101801501016133");
}

#[test]
fn length_field_and_payload() {
    let cmd = Command {
        ng: true,
        code: 0x0385,
        data: &[0xAA, 0xBB, 0xCC],
    };
    let b = cmd.to_bytes();
    assert_eq!(&b[4..6], &[0x03, 0x80]);
    assert_eq!(&b[6..8], &[0x85, 0x03]);
    assert_eq!(&b[8..11], &[0xAA, 0xBB, 0xCC]);
    assert_eq!(&b[11..], b"a3");
}
