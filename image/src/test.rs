use super::*;

#[test]
fn write_read_round_trip() {
    let path = "test.img";

    let cells: Vec<u32> = vec![0x4000_0005, 0x7000_0000, 0xF000_0000];
    let memory_orig = Memory::from(cells);

    write_file(path, &memory_orig).unwrap();
    let memory_read = read_file(path).unwrap();

    assert_eq!(memory_orig, memory_read);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn write_read_via_buffer() {
    let mut buffer = Vec::new();
    let memory_orig = Memory::from(vec![1, 2, 3, 4]);

    write(&mut buffer, &memory_orig).unwrap();
    assert_eq!(buffer, b"00000001\n00000002\n00000003\n00000004\n".to_vec());

    let memory_read = read(&buffer[..]).unwrap();
    assert_eq!(memory_orig, memory_read);
}

#[test]
fn malformed_word_is_rejected() {
    let err = read(&b"0000000Z\n"[..]).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
