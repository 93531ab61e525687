mod common;

use sfs::debug::inspect;
use sfs::{BLOCK_SIZE, BlockId};

use common::{disk, mounted, pattern};

#[test]
fn hello_dump() {
    let (disk, mut fs) = mounted(1024);
    let inumber = fs.create().unwrap();
    fs.write(inumber, b"hello", 0).unwrap();

    let expected = "\
SuperBlock:
    magic number is valid
    1024 blocks
    103 inode blocks
    13184 inodes
Inode 0:
    size: 5 bytes
    direct blocks: 104
";
    assert_eq!(inspect(&disk).to_string(), expected);
}

#[test]
fn indirect_dump() {
    // 一个索引节点块，数据块从 2 开始
    let (disk, mut fs) = mounted(10);
    fs.create().unwrap();
    let inumber = fs.create().unwrap();
    fs.write(inumber, &pattern(6 * BLOCK_SIZE + 1, 1), 0).unwrap();

    let report = inspect(&disk);
    assert_eq!(report.inodes.len(), 2);
    let inode = &report.inodes[1];
    assert_eq!(inode.inumber, 1);
    // 间接指针块先于数据块分配
    let expected = "\
Inode 1:
    size: 24577 bytes
    direct blocks: 3 4 5 6 7
    indirect block: 2
    indirect data blocks: 8 9
";
    assert_eq!(inode.to_string(), expected);
    assert_eq!(inode.indirect.as_ref().unwrap().block, BlockId::new(2));

    assert!(report.to_string().contains("Inode 0:\n    size: 0 bytes\n    direct blocks:\n"));
}

#[test]
fn invalid_magic() {
    let disk = disk(4);
    let report = inspect(&disk);
    assert!(!report.super_block.is_valid());
    assert!(report.inodes.is_empty());
    assert!(report.to_string().contains("magic number is invalid"));
}

#[test]
fn read_only() {
    let (disk, mut fs) = mounted(16);
    fs.create().unwrap();
    let writes = disk.writes();

    inspect(&disk);
    assert_eq!(disk.writes(), writes);
    assert!(disk.mounted());
}
