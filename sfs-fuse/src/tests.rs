use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use block_dev::{BLOCK_SIZE, BlockDevice, Disk};
use sfs::FileSystem;

use crate::BlockFile;

fn image_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sfs-{}-{name}.img", std::process::id()))
}

#[test]
fn block_io() {
    let path = image_path("block-io");
    let file = BlockFile::create(&path, 4).unwrap();
    assert_eq!(file.block_count(), 4);

    let data = [7; BLOCK_SIZE];
    file.write_block(3, &data);
    let mut back = [0; BLOCK_SIZE];
    file.read_block(3, &mut back);
    assert_eq!(data, back);

    file.read_block(0, &mut back);
    assert!(back.iter().all(|&b| b == 0));

    drop(file);
    assert_eq!(fs::metadata(&path).unwrap().len(), 4 * BLOCK_SIZE as u64);
    fs::remove_file(path).unwrap();
}

#[test]
fn image_round_trip() {
    let path = image_path("round-trip");
    {
        let disk = Arc::new(Disk::new(Arc::new(BlockFile::create(&path, 32).unwrap())));
        FileSystem::format(&disk).unwrap();

        let mut fs = FileSystem::new();
        fs.mount(disk).unwrap();
        let inumber = fs.create().unwrap();
        assert_eq!(fs.write(inumber, b"on the host", 0), Ok(11));
    }

    let file = BlockFile::open(&path).unwrap();
    assert_eq!(file.block_count(), 32);

    let mut fs = FileSystem::new();
    fs.mount(Arc::new(Disk::new(Arc::new(file)))).unwrap();
    let mut buf = [0; 11];
    assert_eq!(fs.read(0, &mut buf, 0), Ok(11));
    assert_eq!(&buf, b"on the host");

    drop(fs);
    fs::remove_file(path).unwrap();
}
