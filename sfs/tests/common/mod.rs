#![allow(dead_code)]

use std::sync::Arc;

use block_dev::{Disk, MemoryDisk};
use sfs::FileSystem;
use sfs::debug::{self, Report};

pub fn disk(blocks: usize) -> Arc<Disk> {
    Arc::new(Disk::new(Arc::new(MemoryDisk::new(blocks))))
}

/// 格式化并挂载一块新盘
pub fn mounted(blocks: usize) -> (Arc<Disk>, FileSystem) {
    let disk = disk(blocks);
    FileSystem::format(&disk).unwrap();
    let mut fs = FileSystem::new();
    fs.mount(disk.clone()).unwrap();
    (disk, fs)
}

/// 可复现的伪随机字节
pub fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// 超级块、索引节点区域与所有有效索引节点引用的块之和
pub fn expected_used(report: &Report) -> usize {
    let reserved = 1 + report.super_block.inode_blocks as usize;
    let owned: usize = report
        .inodes
        .iter()
        .map(|inode| {
            inode.direct.len()
                + inode
                    .indirect
                    .as_ref()
                    .map_or(0, |indirect| 1 + indirect.data.len())
        })
        .sum();
    reserved + owned
}

pub fn inspect(disk: &Disk) -> Report {
    debug::inspect(disk)
}
