#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Write};
use std::io::{Seek, SeekFrom};
use std::sync::Mutex;

use chain_fs::BlockDevice;
use chain_fs::BLOCK_SIZE;
use kernel::Console;

/// 宿主文件充当块设备
pub struct BlockFile(pub Mutex<File>);

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(file.read(buf).unwrap(), BLOCK_SIZE, "not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(
            file.write(buf).unwrap(),
            BLOCK_SIZE,
            "not a complete block!"
        );
    }
}

/// 内存块设备，测试里免去临时文件
pub struct MemDisk(Mutex<Vec<u8>>);

impl MemDisk {
    pub fn new(total_blocks: usize) -> Self {
        Self(Mutex::new(vec![0; total_blocks * BLOCK_SIZE]))
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let disk = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&disk[start..start + BLOCK_SIZE]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut disk = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        disk[start..start + BLOCK_SIZE].copy_from_slice(buf);
    }
}

/// 缓冲控制台：输出攒起来、输入先喂后读
#[derive(Default)]
pub struct BufferedConsole {
    output: Mutex<Vec<u8>>,
    input: Mutex<VecDeque<u8>>,
}

impl BufferedConsole {
    pub fn feed_input(&self, bytes: &[u8]) {
        self.input.lock().unwrap().extend(bytes);
    }

    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.output.lock().unwrap())
    }
}

impl Console for BufferedConsole {
    fn putchar(&self, c: u8) {
        self.output.lock().unwrap().push(c);
    }

    fn getchar(&self) -> Option<u8> {
        self.input.lock().unwrap().pop_front()
    }
}
