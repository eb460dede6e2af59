//! # 系统调用层
//!
//! 陷入边界把调用号与陷入帧交进来，这里解码参数、路由到
//! 各子系统，并把结果折算成 `gpr[0]` 里的结果码：非负是
//! 成功值，负数对应 [`KernelError::code`]。
//!
//! 进程共享一块平坦内存，用户缓冲区以 `&mut [u8]` 上的
//! 偏移传入，越界一律报 `BadAddress`。

use enumflags2::BitFlags;

use crate::error::{KernelError, KernelResult};
use crate::fs::{OpenFlag, SeekFrom};
use crate::task::Context;
use crate::Kernel;

pub const YIELD: u32 = 0x00;
pub const WRITE: u32 = 0x01;
pub const READ: u32 = 0x02;
pub const FORK: u32 = 0x03;
pub const EXIT: u32 = 0x04;
pub const EXEC: u32 = 0x05;
pub const KILL: u32 = 0x06;
pub const RAISE: u32 = 0x07;
pub const CHAN_OPEN: u32 = 0x08;
pub const CHAN_SEND: u32 = 0x09;
pub const CHAN_RECV: u32 = 0x0a;
pub const FORMAT: u32 = 0x0b;
pub const BLOCK_READ: u32 = 0x0c;
pub const OPEN: u32 = 0x0d;
pub const CLOSE: u32 = 0x0e;
pub const SEEK: u32 = 0x0f;
pub const TELL: u32 = 0x10;

impl Kernel {
    /// 分发一次系统调用。
    /// `id` 由陷入处理程序从调用指令解出，参数在 `gpr[0..=2]`。
    pub fn handle_syscall(&mut self, id: u32, ctx: &mut Context, mem: &mut [u8]) {
        let [a0, a1, a2] = [ctx.gpr[0], ctx.gpr[1], ctx.gpr[2]];

        match id {
            YIELD => self.schedule(ctx),
            EXIT => self.exit(ctx),
            RAISE => self.raise(ctx, a0),
            EXEC => self.exec(ctx, a0),
            WRITE => {
                let r = self.sys_write(a0, a1, a2, mem);
                write_back(ctx, r.map(|n| n as u32));
            }
            READ => {
                let r = self.sys_read(a0, a1, a2, mem);
                write_back(ctx, r.map(|n| n as u32));
            }
            FORK => {
                // 子进程的返回值寄存器在 fork 里已清零
                let r = self.fork(ctx);
                write_back(ctx, r);
            }
            KILL => {
                let r = self.sys_kill(a0, a1);
                write_back(ctx, r.map(|_| 0));
            }
            CHAN_OPEN => {
                let r = self.channel_open(a0);
                write_back(ctx, r);
            }
            CHAN_SEND => {
                let r = self.channel_send(a0, a1);
                write_back(ctx, r.map(|_| 0));
            }
            CHAN_RECV => {
                let r = self.channel_receive(a0);
                write_back(ctx, r);
            }
            FORMAT => {
                self.format();
                ctx.set_return(0);
            }
            BLOCK_READ => {
                let r = self.sys_block_read(a0, a1, mem);
                write_back(ctx, r.map(|_| 0));
            }
            OPEN => {
                let r = self.sys_open(a0, a1, mem);
                write_back(ctx, r);
            }
            CLOSE => {
                let r = file_fd(a0).and_then(|fd| self.close(fd));
                write_back(ctx, r.map(|_| 0));
            }
            SEEK => {
                let r = file_fd(a0).and_then(|fd| {
                    let whence = SeekFrom::try_from(a2)?;
                    self.lseek(fd, a1 as i32, whence)
                });
                write_back(ctx, r);
            }
            TELL => {
                let r = file_fd(a0).and_then(|fd| self.tell(fd));
                write_back(ctx, r);
            }
            _ => {
                log::warn!("unknown syscall id {id:#x}");
                ctx.set_return(KernelError::UnknownSyscall.code());
            }
        }
    }

    fn sys_write(&mut self, fd: u32, ptr: u32, len: u32, mem: &[u8]) -> KernelResult<usize> {
        let buf = user_slice(mem, ptr, len)?;
        match fd {
            // 描述符 1/2 直通控制台
            1 | 2 => {
                for &c in buf {
                    self.console.putchar(c);
                }
                Ok(buf.len())
            }
            0 => Err(KernelError::BadDescriptor),
            _ => self.fd_write(file_fd(fd)?, buf),
        }
    }

    fn sys_read(&mut self, fd: u32, ptr: u32, len: u32, mem: &mut [u8]) -> KernelResult<usize> {
        match fd {
            // 描述符 0 直通控制台，读到没有输入为止
            0 => {
                let buf = user_slice_mut(mem, ptr, len)?;
                let mut n = 0;
                for slot in buf.iter_mut() {
                    match self.console.getchar() {
                        Some(c) => {
                            *slot = c;
                            n += 1;
                        }
                        None => break,
                    }
                }
                Ok(n)
            }
            1 | 2 => Err(KernelError::BadDescriptor),
            _ => {
                let fd = file_fd(fd)?;
                let buf = user_slice_mut(mem, ptr, len)?;
                self.fd_read(fd, buf)
            }
        }
    }

    fn sys_kill(&mut self, pid: u32, signal: u32) -> KernelResult<()> {
        let signal = crate::task::Signal::try_from(signal)?;
        // 保留 pid 加 SIGKILL 是全体停机的操作符拼法
        if pid == crate::config::SHUTDOWN_PID && signal == crate::task::Signal::Kill {
            self.shutdown_all();
            return Ok(());
        }
        self.kill(pid, signal)
    }

    fn sys_open(&mut self, path_ptr: u32, flags: u32, mem: &[u8]) -> KernelResult<u32> {
        let path = user_str(mem, path_ptr)?;
        let flags = BitFlags::<OpenFlag>::from_bits_truncate(flags);
        self.open(path, flags).map(|fd| fd + FIRST_FILE_FD)
    }

    fn sys_block_read(&mut self, block_id: u32, ptr: u32, mem: &mut [u8]) -> KernelResult<()> {
        let buf = user_slice_mut(mem, ptr, chain_fs::BLOCK_SIZE as u32)?;
        self.device.read_block(block_id as usize, buf);
        Ok(())
    }
}

/// 文件描述符在用户眼中从 3 起步，0/1/2 归控制台
const FIRST_FILE_FD: u32 = 3;

fn file_fd(fd: u32) -> KernelResult<u32> {
    fd.checked_sub(FIRST_FILE_FD)
        .ok_or(KernelError::BadDescriptor)
}

fn write_back(ctx: &mut Context, result: KernelResult<u32>) {
    ctx.set_return(match result {
        Ok(value) => value as i32,
        Err(e) => e.code(),
    });
}

fn user_slice(mem: &[u8], ptr: u32, len: u32) -> KernelResult<&[u8]> {
    let end = ptr.checked_add(len).ok_or(KernelError::BadAddress)?;
    mem.get(ptr as usize..end as usize)
        .ok_or(KernelError::BadAddress)
}

fn user_slice_mut(mem: &mut [u8], ptr: u32, len: u32) -> KernelResult<&mut [u8]> {
    let end = ptr.checked_add(len).ok_or(KernelError::BadAddress)?;
    mem.get_mut(ptr as usize..end as usize)
        .ok_or(KernelError::BadAddress)
}

/// 读出用户内存里以 NUL 结尾的路径串
fn user_str(mem: &[u8], ptr: u32) -> KernelResult<&str> {
    let tail = mem.get(ptr as usize..).ok_or(KernelError::BadAddress)?;
    let end = tail
        .iter()
        .position(|&c| c == 0)
        .ok_or(KernelError::BadAddress)?;
    core::str::from_utf8(&tail[..end]).map_err(|_| KernelError::BadAddress)
}
