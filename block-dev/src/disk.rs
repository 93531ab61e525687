use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{BLOCK_SIZE, BlockDevice};

/// 带挂载闸门的磁盘
///
/// 同一时刻只允许一个文件系统挂载它；读写次数被记录下来，供调试与测试观察。
#[derive(Debug)]
pub struct Disk {
    dev: Arc<dyn BlockDevice>,
    mounted: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    mounts: AtomicUsize,
}

impl Disk {
    pub fn new(dev: Arc<dyn BlockDevice>) -> Self {
        Self {
            dev,
            mounted: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            mounts: AtomicUsize::new(0),
        }
    }

    /// 磁盘总块数
    #[inline]
    pub fn size(&self) -> usize {
        self.dev.block_count()
    }

    pub fn read(&self, block_id: usize, buf: &mut [u8; BLOCK_SIZE]) {
        self.sanity_check(block_id);
        self.dev.read_block(block_id, buf);
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write(&self, block_id: usize, buf: &[u8; BLOCK_SIZE]) {
        self.sanity_check(block_id);
        self.dev.write_block(block_id, buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// 独占磁盘。已被挂载时返回 `false`，状态不变。
    pub fn mount(&self) -> bool {
        let claimed = self
            .mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.mounts.fetch_add(1, Ordering::Relaxed);
        }
        claimed
    }

    #[inline]
    pub fn mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    #[inline]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::Relaxed)
    }
}

impl Disk {
    fn sanity_check(&self, block_id: usize) {
        assert!(
            block_id < self.size(),
            "block {block_id} out of range ({} blocks)",
            self.size()
        );
    }
}
