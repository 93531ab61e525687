//! 索引节点与间接指针块
//!
//! 一个索引节点最多可编号 5 + 1024 个数据块：
//! - 直接指针：5 个块编号，直接指向数据块
//! - 间接指针：指向一个指针块，块内连续存储至多 1024 个数据块编号
//!
//! 文件第一次用到第 6 个数据块时分配间接指针块，删除文件时一并释放。

use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use block_dev::Disk;

use super::{get_u32, put_u32};
use crate::addr::{Slot, count_data_blocks};
use crate::{
    BLOCK_SIZE, BlockId, BlockIndex, DataBlock, INODE_SIZE, INODES_PER_BLOCK, MAX_FILE_SIZE,
    POINTERS_PER_BLOCK, POINTERS_PER_INODE,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskInode {
    pub valid: bool,
    /// 文件字节数
    pub size: u32,
    direct: [BlockId; POINTERS_PER_INODE],
    /// 仅在数据块多于直接指针时有意义
    indirect: BlockId,
}

/// 索引节点块：128 个索引节点
#[derive(Debug, Clone)]
pub struct InodeBlock([DiskInode; INODES_PER_BLOCK]);

/// 间接指针块
#[derive(Debug, Clone)]
pub struct PointerBlock([BlockId; POINTERS_PER_BLOCK]);

impl DiskInode {
    pub const EMPTY: Self = Self {
        valid: false,
        size: 0,
        direct: [BlockId::SUPER; POINTERS_PER_INODE],
        indirect: BlockId::SUPER,
    };

    /// 新文件：有效、为空、不指向任何块
    #[inline]
    pub fn init(&mut self) {
        *self = Self {
            valid: true,
            ..Self::EMPTY
        };
    }

    /// `raw` 为一条 [`INODE_SIZE`] 字节的记录
    pub fn decode(raw: &[u8]) -> Self {
        let mut direct = [BlockId::SUPER; POINTERS_PER_INODE];
        for (i, id) in direct.iter_mut().enumerate() {
            *id = BlockId::new(get_u32(raw, 2 + i));
        }

        Self {
            valid: get_u32(raw, 0) != 0,
            size: get_u32(raw, 1),
            direct,
            indirect: BlockId::new(get_u32(raw, 2 + POINTERS_PER_INODE)),
        }
    }

    pub fn encode(&self, raw: &mut [u8]) {
        put_u32(raw, 0, self.valid as u32);
        put_u32(raw, 1, self.size);
        for (i, &id) in self.direct.iter().enumerate() {
            put_u32(raw, 2 + i, id.into());
        }
        put_u32(raw, 2 + POINTERS_PER_INODE, self.indirect.into());
    }

    /// 当前大小占用多少个数据块
    #[inline]
    pub fn data_blocks(&self) -> usize {
        count_data_blocks(self.size as usize)
    }

    /// 正在使用的直接指针
    #[inline]
    pub fn direct(&self) -> &[BlockId] {
        &self.direct[..self.data_blocks().min(POINTERS_PER_INODE)]
    }

    #[inline]
    pub fn indirect(&self) -> Option<BlockId> {
        (self.data_blocks() > POINTERS_PER_INODE).then_some(self.indirect)
    }

    /// 大小不超过上限，且间接指针块位于卷内
    pub fn is_sane(&self, total_blocks: u32) -> bool {
        self.size as usize <= MAX_FILE_SIZE
            && self
                .indirect()
                .is_none_or(|id| u32::from(id) < total_blocks)
    }

    /// 间接指针块中正在使用的数据块编号
    pub fn indirect_blocks(&self, disk: &Disk) -> Vec<BlockId> {
        match self.indirect() {
            Some(id) => {
                PointerBlock::load(id, disk)[..self.data_blocks() - POINTERS_PER_INODE].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// 文件占有的全部块：数据块，以及间接指针块本身
    pub fn owned_blocks(&self, disk: &Disk) -> Vec<BlockId> {
        let mut blocks = self.direct().to_vec();
        if let Some(indirect) = self.indirect() {
            blocks.extend(self.indirect_blocks(disk));
            blocks.push(indirect);
        }
        blocks
    }

    /// 把从 `first` 起的 `count` 个逻辑块翻译为物理块号。
    /// 这些逻辑块必须已经分配；间接指针块至多读一次。
    pub fn resolve(&self, first: BlockIndex, count: usize, disk: &Disk) -> Vec<BlockId> {
        let first = u32::from(first);
        let mut pointers: Option<PointerBlock> = None;

        (first..first + count as u32)
            .map(|index| match BlockIndex::new(index).slot() {
                Slot::Direct(i) => self.direct[i],
                Slot::Indirect(i) => {
                    pointers.get_or_insert_with(|| PointerBlock::load(self.indirect, disk))[i]
                }
            })
            .collect()
    }

    /// 把文件扩大到 `larger_size` 字节，按逻辑顺序挂上新分配的数据块：
    /// 先填直接指针，再填间接指针块。
    /// `indirect` 为本次新分配的间接指针块，仅在首次越过直接指针时给出。
    pub fn expand_to(
        &mut self,
        larger_size: u32,
        indirect: Option<BlockId>,
        new_blocks: Vec<BlockId>,
        disk: &Disk,
    ) {
        let mut block_index = self.data_blocks();
        self.size = larger_size;
        let new_total_blocks = self.data_blocks();
        debug_assert_eq!(new_total_blocks - block_index, new_blocks.len());
        let mut new_blocks = new_blocks.into_iter();

        /******************** 直接指针 ********************/
        while block_index < new_total_blocks.min(POINTERS_PER_INODE) {
            let Some(id) = new_blocks.next() else {
                break;
            };
            self.direct[block_index] = id;
            block_index += 1;
        }
        /******************** END ********************/

        if new_total_blocks <= POINTERS_PER_INODE || block_index == new_total_blocks {
            return;
        }

        /******************** 间接指针 ********************/
        let mut pointers = match indirect {
            Some(id) => {
                self.indirect = id;
                PointerBlock::EMPTY
            }
            None => PointerBlock::load(self.indirect, disk),
        };

        while block_index < new_total_blocks {
            let Some(id) = new_blocks.next() else {
                break;
            };
            pointers[block_index - POINTERS_PER_INODE] = id;
            block_index += 1;
        }

        pointers.store(self.indirect, disk);
        /******************** END ********************/
    }

    /// 从指定位置(字节偏移)读出数据填充`buf`，不越过文件末尾
    pub fn read_at(&self, offset: usize, buf: &mut [u8], disk: &Disk) -> usize {
        let end = (offset + buf.len()).min(self.size as usize);
        if offset >= end {
            return 0;
        }

        let (first, count) = span(offset, end);
        let mut start = offset;
        // 已读取多少字节
        let mut read_size = 0;
        let mut data_block: DataBlock = [0; BLOCK_SIZE];
        for block_id in self.resolve(first, count, disk) {
            // 当前块的末地址(字节)
            let current_block_end = (BlockIndex::of_offset(start).start() + BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            // 绝对地址 % 块大小 = 块内偏移
            let inner = start % BLOCK_SIZE;

            disk.read(block_id.as_usize(), &mut data_block);
            buf[read_size..read_size + block_read_size]
                .copy_from_slice(&data_block[inner..inner + block_read_size]);

            read_size += block_read_size;
            start = current_block_end;
        }

        read_size
    }

    /// 覆写 `[offset, offset + buf.len())`，该范围必须已在文件之内。
    /// 只写一部分的块先读后写，块内其余字节保持原样。
    pub fn write_at(&self, offset: usize, buf: &[u8], disk: &Disk) -> usize {
        let end = offset + buf.len();
        assert!(end <= self.size as usize);
        if offset == end {
            return 0;
        }

        let (first, count) = span(offset, end);
        let mut start = offset;
        let mut written_size = 0;
        let mut data_block: DataBlock = [0; BLOCK_SIZE];
        for block_id in self.resolve(first, count, disk) {
            let current_block_end = (BlockIndex::of_offset(start).start() + BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;
            let inner = start % BLOCK_SIZE;

            if block_write_size < BLOCK_SIZE {
                disk.read(block_id.as_usize(), &mut data_block);
            }
            data_block[inner..inner + block_write_size]
                .copy_from_slice(&buf[written_size..written_size + block_write_size]);
            disk.write(block_id.as_usize(), &data_block);

            written_size += block_write_size;
            start = current_block_end;
        }

        written_size
    }
}

/// 覆盖字节范围 `[offset, end)` 的首个逻辑块及块数
#[inline]
fn span(offset: usize, end: usize) -> (BlockIndex, usize) {
    let first = BlockIndex::of_offset(offset);
    (first, count_data_blocks(end) - u32::from(first) as usize)
}

impl InodeBlock {
    pub fn decode(block: &DataBlock) -> Self {
        let mut inodes = [DiskInode::EMPTY; INODES_PER_BLOCK];
        for (inode, raw) in inodes.iter_mut().zip(block.chunks_exact(INODE_SIZE)) {
            *inode = DiskInode::decode(raw);
        }
        Self(inodes)
    }

    pub fn encode(&self, block: &mut DataBlock) {
        for (inode, raw) in self.0.iter().zip(block.chunks_exact_mut(INODE_SIZE)) {
            inode.encode(raw);
        }
    }

    pub fn load(id: BlockId, disk: &Disk) -> Self {
        let mut block = [0; BLOCK_SIZE];
        disk.read(id.as_usize(), &mut block);
        Self::decode(&block)
    }

    /// 整块写回，从不只写一条记录
    pub fn store(&self, id: BlockId, disk: &Disk) {
        let mut block = [0; BLOCK_SIZE];
        self.encode(&mut block);
        disk.write(id.as_usize(), &block);
    }
}

impl Deref for InodeBlock {
    type Target = [DiskInode; INODES_PER_BLOCK];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for InodeBlock {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl PointerBlock {
    pub const EMPTY: Self = Self([BlockId::SUPER; POINTERS_PER_BLOCK]);

    pub fn decode(block: &DataBlock) -> Self {
        let mut pointers = Self::EMPTY;
        for (id, raw) in pointers.0.iter_mut().zip(block.chunks_exact(4)) {
            *id = BlockId::new(get_u32(raw, 0));
        }
        pointers
    }

    pub fn encode(&self, block: &mut DataBlock) {
        for (&id, raw) in self.0.iter().zip(block.chunks_exact_mut(4)) {
            put_u32(raw, 0, id.into());
        }
    }

    pub fn load(id: BlockId, disk: &Disk) -> Self {
        let mut block = [0; BLOCK_SIZE];
        disk.read(id.as_usize(), &mut block);
        Self::decode(&block)
    }

    pub fn store(&self, id: BlockId, disk: &Disk) {
        let mut block = [0; BLOCK_SIZE];
        self.encode(&mut block);
        disk.write(id.as_usize(), &block);
    }
}

impl Deref for PointerBlock {
    type Target = [BlockId; POINTERS_PER_BLOCK];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PointerBlock {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;

    use block_dev::{Disk, MemoryDisk};

    use super::*;

    fn disk(blocks: usize) -> Disk {
        Disk::new(Arc::new(MemoryDisk::new(blocks)))
    }

    fn ids(range: core::ops::Range<u32>) -> Vec<BlockId> {
        range.map(BlockId::new).collect()
    }

    #[test]
    fn record_layout() {
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.size = 7;
        inode.direct[0] = BlockId::new(42);

        let mut raw = [0xaa; INODE_SIZE];
        inode.encode(&mut raw);
        assert_eq!(&raw[..4], &1u32.to_le_bytes());
        assert_eq!(&raw[4..8], &7u32.to_le_bytes());
        assert_eq!(&raw[8..12], &42u32.to_le_bytes());
        assert_eq!(&raw[28..32], &0u32.to_le_bytes());
        assert_eq!(DiskInode::decode(&raw), inode);
    }

    #[test]
    fn inode_block_slots() {
        let mut block = InodeBlock::decode(&[0; BLOCK_SIZE]);
        assert!(block.iter().all(|inode| !inode.valid));

        block[127].init();
        block[127].size = 9;
        let mut raw = [0; BLOCK_SIZE];
        block.encode(&mut raw);
        assert_eq!(&raw[127 * INODE_SIZE..127 * INODE_SIZE + 4], &1u32.to_le_bytes());

        let back = InodeBlock::decode(&raw);
        assert_eq!(back[127].size, 9);
        assert!(!back[126].valid);
    }

    #[test]
    fn direct_only() {
        let disk = disk(16);
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.expand_to(3 * BLOCK_SIZE as u32, None, ids(10..13), &disk);

        assert_eq!(inode.direct(), ids(10..13).as_slice());
        assert_eq!(inode.indirect(), None);
        assert_eq!(inode.resolve(BlockIndex::new(1), 2, &disk), ids(11..13));
        assert_eq!(inode.owned_blocks(&disk), ids(10..13));
        // 没有读过间接指针块
        assert_eq!(disk.reads(), 0);
    }

    #[test]
    fn through_indirect() {
        let disk = disk(32);
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.expand_to(4 * BLOCK_SIZE as u32, None, ids(10..14), &disk);
        // 越过直接指针：补齐第 5 块并进入间接指针块
        inode.expand_to(7 * BLOCK_SIZE as u32 - 1, Some(BlockId::new(20)), ids(14..17), &disk);

        assert_eq!(inode.indirect(), Some(BlockId::new(20)));
        assert_eq!(inode.indirect_blocks(&disk), ids(15..17));
        assert_eq!(inode.resolve(BlockIndex::new(0), 7, &disk), ids(10..17));

        inode.expand_to(8 * BLOCK_SIZE as u32, None, ids(17..18), &disk);
        assert_eq!(inode.indirect_blocks(&disk), ids(15..18));

        let mut owned = inode.owned_blocks(&disk);
        owned.sort();
        let mut expected = ids(10..18);
        expected.push(BlockId::new(20));
        assert_eq!(owned, expected);
    }

    #[test]
    fn partial_block_overwrite() {
        let disk = disk(8);
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.expand_to(2 * BLOCK_SIZE as u32, None, ids(3..5), &disk);

        let fill = vec![0x11; 2 * BLOCK_SIZE];
        assert_eq!(inode.write_at(0, &fill, &disk), 2 * BLOCK_SIZE);

        // 跨越块边界的写入
        let offset = BLOCK_SIZE - 3;
        assert_eq!(inode.write_at(offset, b"abcdef", &disk), 6);

        let mut back = vec![0; 2 * BLOCK_SIZE];
        assert_eq!(inode.read_at(0, &mut back, &disk), 2 * BLOCK_SIZE);
        assert_eq!(&back[offset..offset + 6], b"abcdef");
        assert!(back[..offset].iter().all(|&b| b == 0x11));
        assert!(back[offset + 6..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn read_clamped() {
        let disk = disk(8);
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.expand_to(10, None, ids(3..4), &disk);
        inode.write_at(0, b"0123456789", &disk);

        let mut buf = [0; 32];
        assert_eq!(inode.read_at(4, &mut buf, &disk), 6);
        assert_eq!(&buf[..6], b"456789");
        assert_eq!(inode.read_at(10, &mut buf, &disk), 0);
    }

    #[test]
    fn sanity() {
        let mut inode = DiskInode::EMPTY;
        inode.init();
        inode.size = 6 * BLOCK_SIZE as u32;
        inode.indirect = BlockId::new(99);
        assert!(!inode.is_sane(50));
        assert!(inode.is_sane(100));

        inode.size = u32::MAX;
        assert!(!inode.is_sane(100));
    }
}
