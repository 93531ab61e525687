use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use spin::Mutex;

use crate::{BLOCK_SIZE, BlockDevice};

/// 内存中的块设备，内容随进程结束而消失
pub struct MemoryDisk {
    data: Mutex<Vec<u8>>,
    blocks: usize,
}

impl MemoryDisk {
    /// 创建 `blocks` 个全零块
    pub fn new(blocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; blocks * BLOCK_SIZE]),
            blocks,
        }
    }

    /// 以现成的镜像内容创建，长度须为块大小的整数倍
    pub fn from_image(image: Vec<u8>) -> Self {
        assert_eq!(0, image.len() % BLOCK_SIZE, "not a complete block!");
        let blocks = image.len() / BLOCK_SIZE;
        Self {
            data: Mutex::new(image),
            blocks,
        }
    }

    /// 整个镜像的拷贝
    pub fn image(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl fmt::Debug for MemoryDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDisk")
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

impl BlockDevice for MemoryDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&self.data.lock()[start..start + BLOCK_SIZE]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
        let start = block_id * BLOCK_SIZE;
        self.data.lock()[start..start + BLOCK_SIZE].copy_from_slice(buf);
    }

    #[inline]
    fn block_count(&self) -> usize {
        self.blocks
    }
}
