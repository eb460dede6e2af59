use std::collections::HashSet;
use std::sync::Arc;

use chain_fs::{
    ChainFileSystem, DiskInodeKind, FsError, Inode, Resolved, MAGIC, TOTAL_BLOCKS,
};
use enumflags2::BitFlags;
use kernel::config::{BootConfig, SHUTDOWN_PID, STACK_STRIDE};
use kernel::{syscall, Context, Kernel, KernelError, OpenFlag, ProcessState, SeekFrom, Signal};

use crate::{BufferedConsole, MemDisk};

/// 数据区块数，与固化几何一致
const DATA_BLOCKS: usize = 1982;

fn fresh_disk() -> Arc<MemDisk> {
    Arc::new(MemDisk::new(TOTAL_BLOCKS as usize))
}

/// 把空闲表抽干，返回吐出的全部地址
fn drain(fs: &mut ChainFileSystem) -> Vec<u32> {
    let mut out = Vec::new();
    loop {
        match fs.alloc_data() {
            Ok(block) => out.push(block),
            Err(FsError::NoSpace) => break,
            Err(e) => panic!("unexpected allocator error: {e}"),
        }
    }
    out
}

fn assert_all_distinct(blocks: &[u32]) {
    let unique: HashSet<u32> = blocks.iter().copied().collect();
    assert_eq!(unique.len(), blocks.len());
}

#[test]
fn format_hands_out_every_data_block_once() {
    let fs = ChainFileSystem::format(fresh_disk());
    let blocks = drain(&mut fs.lock());

    assert_eq!(blocks.len(), DATA_BLOCKS);
    assert_all_distinct(&blocks);
    for &block in &blocks {
        assert!((66..2048).contains(&block), "block {block} outside data area");
    }
}

#[test]
fn allocator_survives_chain_boundary_round_trip() {
    let fs = ChainFileSystem::format(fresh_disk());
    let mut fs = fs.lock();

    // 超过一个链块容量的分配再归还，跨越链块边界
    let held: Vec<u32> = (0..200).map(|_| fs.alloc_data().unwrap()).collect();
    assert_all_distinct(&held);
    for block in held {
        fs.dealloc_data(block);
    }

    // 单块的取还打满一整圈
    for _ in 0..200 {
        let block = fs.alloc_data().unwrap();
        fs.dealloc_data(block);
    }

    // 既不丢块也不重复
    let blocks = drain(&mut fs);
    assert_eq!(blocks.len(), DATA_BLOCKS);
    assert_all_distinct(&blocks);
}

#[test]
fn resolve_creates_missing_final_component() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);
    root.create("a", DiskInodeKind::Directory).unwrap();

    let resolved = root.resolve("/a/b").unwrap();
    assert!(resolved.created());
    let ino = resolved.inode().ino();

    // 再解析命中同一个 inode
    match root.resolve("/a/b").unwrap() {
        Resolved::Found(inode) => assert_eq!(inode.ino(), ino),
        Resolved::Created(_) => panic!("second resolve must hit"),
    }
}

#[test]
fn resolve_fails_on_missing_intermediate() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);

    assert!(matches!(root.resolve("/x/y"), Err(FsError::NotFound)));
    // 失败不留痕迹
    assert!(root.find("x").is_none());

    // 中间组件是普通文件也算不通
    root.create("f", DiskInodeKind::Regular).unwrap();
    assert!(matches!(root.resolve("/f/y"), Err(FsError::NotDirectory)));
}

#[test]
fn create_rejects_duplicates_and_long_names() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);

    root.create("twice", DiskInodeKind::Regular).unwrap();
    assert!(matches!(
        root.create("twice", DiskInodeKind::Regular),
        Err(FsError::AlreadyExists)
    ));

    let too_long = "abcdefghijklmnopqrstuvwxyz"; // 26 字符
    assert_eq!(too_long.len(), 26);
    assert!(matches!(
        root.create(too_long, DiskInodeKind::Regular),
        Err(FsError::NameTooLong)
    ));
    assert!(matches!(
        root.create("", DiskInodeKind::Regular),
        Err(FsError::NameTooLong)
    ));
}

#[test]
fn directory_entry_names_compare_by_length() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);

    let full = "abcdefghijklmnopqrstuvwxy"; // 恰好 25 字符
    assert_eq!(full.len(), 25);
    root.create(full, DiskInodeKind::Regular).unwrap();

    // 名字整个存下来，前缀不会误中
    assert!(root.find(full).is_some());
    assert!(root.find(&full[..24]).is_none());
}

#[test]
fn directory_fills_at_direct_capacity() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);

    // 16 项每块 × 11 个直接块
    for i in 0..176 {
        root.create(&format!("f{i:03}"), DiskInodeKind::Regular)
            .unwrap();
    }
    assert!(matches!(
        root.create("straw", DiskInodeKind::Regular),
        Err(FsError::DirectoryFull)
    ));

    // 腾出一项后又能进
    root.unlink("f042").unwrap();
    root.create("straw", DiskInodeKind::Regular).unwrap();
}

#[test]
fn file_survives_remount() {
    let device = fresh_disk();

    {
        let fs = ChainFileSystem::format(device.clone());
        let root = Inode::root(&fs);
        let inode = root.resolve("/boot").unwrap().inode();
        inode.write_at(0, b"persistent payload").unwrap();
    }

    let fs = ChainFileSystem::load(device).unwrap();
    let root = Inode::root(&fs);
    let inode = root.find("boot").expect("file lost across remount");

    let mut buf = [0u8; 18];
    assert_eq!(inode.read_at(0, &mut buf), 18);
    assert_eq!(&buf, b"persistent payload");
}

#[test]
fn fresh_disk_fails_to_mount() {
    assert!(matches!(
        ChainFileSystem::load(fresh_disk()),
        Err(FsError::BadSuperBlock)
    ));
}

#[test]
fn write_read_across_indirect_boundary() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);
    let inode = root.resolve("/big").unwrap().inode();

    // 157 块：穿过 11 个直接块与一级索引，探进二级索引
    let data: Vec<u8> = (0..80_000).map(|i| (i % 251) as u8).collect();
    assert_eq!(inode.write_at(0, &data).unwrap(), data.len());
    assert_eq!(inode.size(), 80_000);

    let mut back = vec![0u8; data.len()];
    assert_eq!(inode.read_at(0, &mut back), data.len());
    assert_eq!(back, data);

    // 文件末尾之外读不到东西
    assert_eq!(inode.read_at(80_000, &mut [0u8; 8]), 0);
}

#[test]
fn sparse_hole_reads_zero() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);
    let inode = root.resolve("/sparse").unwrap().inode();

    inode.write_at(8_000, b"tail").unwrap();

    let mut hole = vec![0xffu8; 8_000];
    assert_eq!(inode.read_at(0, &mut hole), 8_000);
    assert!(hole.iter().all(|&b| b == 0));

    let mut tail = [0u8; 4];
    assert_eq!(inode.read_at(8_000, &mut tail), 4);
    assert_eq!(&tail, b"tail");
}

#[test]
fn clear_returns_blocks_to_free_list() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);
    let inode = root.resolve("/fat").unwrap().inode();

    let data = vec![0xa5u8; 80_000];
    inode.write_at(0, &data).unwrap();
    inode.clear();
    assert_eq!(inode.size(), 0);

    // 数据块与各级索引块一个不少地回到空闲表；
    // 根目录自己的目录项块仍在占用中
    let blocks = drain(&mut fs.lock());
    assert_eq!(blocks.len(), DATA_BLOCKS - 1);
    assert_all_distinct(&blocks);
}

#[test]
fn unlink_frees_inode_and_blocks() {
    let fs = ChainFileSystem::format(fresh_disk());
    let root = Inode::root(&fs);

    let inode = root.resolve("/victim").unwrap().inode();
    inode.write_at(0, &vec![1u8; 4_096]).unwrap();
    let victim_ino = inode.ino();

    root.unlink("victim").unwrap();
    assert!(root.find("victim").is_none());
    assert!(matches!(root.unlink("victim"), Err(FsError::NotFound)));

    // inode 记录与目录项槽位都被复用
    let reborn = root.create("reborn", DiskInodeKind::Regular).unwrap();
    assert_eq!(reborn.ino(), victim_ino);

    // 除根目录的目录项块外，其余全部可再分配
    let blocks = drain(&mut fs.lock());
    assert_eq!(blocks.len(), DATA_BLOCKS - 1);
    assert_all_distinct(&blocks);
}

/* ---------- 内核 ---------- */

const INIT_ENTRY: u32 = 0x8000;
const PROG1_ENTRY: u32 = 0x9000;
const STACK_BASE: u32 = 0x0002_0000;

fn boot() -> (Kernel, Context, Arc<BufferedConsole>) {
    let console = Arc::new(BufferedConsole::default());
    let boot = BootConfig {
        init_entry: INIT_ENTRY,
        programs: vec![INIT_ENTRY, PROG1_ENTRY],
        stack_base: STACK_BASE,
    };
    let mut kernel = Kernel::new(fresh_disk(), console.clone(), boot);
    let mut ctx = Context::default();
    kernel.start(&mut ctx);
    (kernel, ctx, console)
}

/// 同优先级下让出处理器：连胜一次吃老化惩罚，第二次重排换人
fn yield_to_next(kernel: &mut Kernel, ctx: &mut Context) {
    let before = kernel.current_pid();
    kernel.schedule(ctx);
    if kernel.current_pid() == before {
        kernel.schedule(ctx);
    }
    assert_ne!(kernel.current_pid(), before);
}

#[test]
fn scheduler_prefers_min_priority_and_ages_winner() {
    let (mut kernel, mut ctx, _) = boot();
    kernel.fork(&ctx).unwrap();
    kernel.fork(&ctx).unwrap();

    // 大家都是 10，pid 定序让现任连任，但记一笔老化
    kernel.schedule(&mut ctx);
    assert_eq!(kernel.current_pid(), 0);
    assert_eq!(kernel.priority_of(0), 11);

    // 现任不再是最小值，换人；让出者恢复基准
    kernel.schedule(&mut ctx);
    assert_eq!(kernel.current_pid(), 1);
    assert_eq!(kernel.priority_of(0), 10);
    assert_eq!(ctx.sp, STACK_BASE + STACK_STRIDE);
}

#[test]
fn fork_exit_recycles_the_same_slot() {
    let (mut kernel, mut ctx, _) = boot();

    assert_eq!(kernel.fork(&ctx).unwrap(), 1);
    yield_to_next(&mut kernel, &mut ctx);
    assert_eq!(kernel.current_pid(), 1);

    kernel.exit(&mut ctx);
    assert_eq!(kernel.state_of(1), ProcessState::Terminated);
    assert_eq!(kernel.current_pid(), 0);
    assert_eq!(ctx.pc, INIT_ENTRY);

    // 恰好空出一个槽位，pid 原样复用
    assert_eq!(kernel.fork(&ctx).unwrap(), 1);
}

#[test]
fn process_table_exhaustion() {
    let (mut kernel, ctx, _) = boot();
    for pid in 1..8 {
        assert_eq!(kernel.fork(&ctx).unwrap(), pid);
    }
    assert_eq!(kernel.fork(&ctx), Err(KernelError::NoProcessSlot));
}

#[test]
fn waiting_process_is_never_selected() {
    let (mut kernel, mut ctx, _) = boot();
    kernel.fork(&ctx).unwrap();
    kernel.kill(1, Signal::Wait).unwrap();

    for _ in 0..4 {
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.current_pid(), 0);
    }

    // 解除等待后，老化积累让它立刻胜出
    kernel.kill(1, Signal::Cont).unwrap();
    kernel.schedule(&mut ctx);
    assert_eq!(kernel.current_pid(), 1);
}

#[test]
fn kill_transitions_follow_the_state_machine() {
    let (mut kernel, ctx, _) = boot();
    kernel.fork(&ctx).unwrap();

    // Cont 只对 Waiting 有效
    kernel.kill(1, Signal::Cont).unwrap();
    assert_eq!(kernel.state_of(1), ProcessState::Executing);

    kernel.kill(1, Signal::Wait).unwrap();
    assert_eq!(kernel.state_of(1), ProcessState::Waiting);
    kernel.kill(1, Signal::Cont).unwrap();
    assert_eq!(kernel.state_of(1), ProcessState::Executing);

    kernel.kill(1, Signal::Kill).unwrap();
    assert_eq!(kernel.state_of(1), ProcessState::Terminated);
    // 终止后信号不再生效
    kernel.kill(1, Signal::Wait).unwrap();
    assert_eq!(kernel.state_of(1), ProcessState::Terminated);

    assert_eq!(kernel.kill(8, Signal::Kill), Err(KernelError::InvalidPid));
}

#[test]
fn shutdown_spares_init() {
    let (mut kernel, ctx, _) = boot();
    for _ in 0..3 {
        kernel.fork(&ctx).unwrap();
    }

    kernel.shutdown_all();
    assert_eq!(kernel.state_of(0), ProcessState::Executing);
    for pid in 1..8 {
        assert_eq!(kernel.state_of(pid), ProcessState::Terminated);
    }
}

#[test]
fn exec_jumps_and_boosts_priority() {
    let (mut kernel, mut ctx, _) = boot();

    kernel.exec(&mut ctx, 1);
    assert_eq!(ctx.pc, PROG1_ENTRY);
    assert_eq!(kernel.priority_of(0), 0);

    // 未知程序号按原样忽略
    kernel.exec(&mut ctx, 42);
    assert_eq!(ctx.pc, PROG1_ENTRY);
}

#[test]
fn raise_takes_effect_before_returning() {
    let (mut kernel, mut ctx, _) = boot();
    kernel.fork(&ctx).unwrap();

    kernel.raise(&mut ctx, Signal::Wait as u32);
    assert_eq!(kernel.state_of(0), ProcessState::Waiting);
    // 自我压入等待后立刻让位
    assert_eq!(kernel.current_pid(), 1);
    assert_eq!(ctx.sp, STACK_BASE + STACK_STRIDE);
}

#[test]
fn mailbox_depth_one_and_anti_echo() {
    let (mut kernel, mut ctx, _) = boot();

    let chan = kernel.channel_open(7).unwrap();
    assert_eq!(chan, 0);
    assert_eq!(kernel.channel_open(7).unwrap(), 0);
    assert_eq!(kernel.channel_open(9).unwrap(), 1);

    kernel.channel_send(chan, 42).unwrap();
    // 深度为 1：上一条没取走就发不进第二条
    assert_eq!(kernel.channel_send(chan, 43), Err(KernelError::ChannelFull));
    // 自己发的读不回来
    assert_eq!(kernel.channel_receive(chan), Err(KernelError::ChannelEmpty));

    kernel.fork(&ctx).unwrap();
    yield_to_next(&mut kernel, &mut ctx);
    assert_eq!(kernel.current_pid(), 1);

    assert_eq!(kernel.channel_receive(chan).unwrap(), 42);
    assert_eq!(kernel.channel_receive(chan), Err(KernelError::ChannelEmpty));
    assert_eq!(kernel.channel_peers(chan), Some((0, 1)));
}

#[test]
fn channel_table_exhaustion() {
    let (mut kernel, _, _) = boot();

    for name in 1..=8 {
        assert_eq!(kernel.channel_open(name).unwrap(), name - 1);
    }
    assert_eq!(kernel.channel_open(100), Err(KernelError::NoChannelSlot));
    // 名字 0 留作“未认领”
    assert_eq!(kernel.channel_open(0), Err(KernelError::InvalidChannel));
    // 已开通道不受表满影响
    assert_eq!(kernel.channel_open(3).unwrap(), 2);
}

#[test]
fn open_before_format_fails() {
    let (mut kernel, _, _) = boot();
    assert_eq!(
        kernel.open("/nope", BitFlags::empty()),
        Err(KernelError::NotMounted)
    );
}

#[test]
fn descriptor_table_fills_and_recycles() {
    let (mut kernel, _, _) = boot();
    kernel.format();

    for i in 0..16 {
        let fd = kernel.open(&format!("/f{i}"), OpenFlag::RDWR.into()).unwrap();
        assert_eq!(fd, i);
    }
    assert_eq!(
        kernel.open("/last", OpenFlag::RDWR.into()),
        Err(KernelError::DescriptorTableFull)
    );

    kernel.close(5).unwrap();
    assert_eq!(kernel.open("/last", OpenFlag::RDWR.into()).unwrap(), 5);
    assert_eq!(kernel.close(5), Ok(()));
    assert_eq!(kernel.close(5), Err(KernelError::BadDescriptor));
}

#[test]
fn kill_releases_open_descriptors() {
    let (mut kernel, mut ctx, _) = boot();
    kernel.format();
    kernel.fork(&ctx).unwrap();

    yield_to_next(&mut kernel, &mut ctx);
    assert_eq!(kernel.current_pid(), 1);
    kernel.open("/a", OpenFlag::RDWR.into()).unwrap();
    kernel.open("/b", OpenFlag::RDWR.into()).unwrap();
    assert_eq!(kernel.open_file_count(), 2);

    yield_to_next(&mut kernel, &mut ctx);
    assert_eq!(kernel.current_pid(), 0);
    kernel.kill(1, Signal::Kill).unwrap();

    // 受害者的打开文件全部回收
    assert_eq!(kernel.open_file_count(), 0);
}

#[test]
fn reformat_invalidates_stale_descriptors() {
    let console = Arc::new(BufferedConsole::default());
    let boot = BootConfig {
        init_entry: INIT_ENTRY,
        programs: vec![INIT_ENTRY, PROG1_ENTRY],
        stack_base: STACK_BASE,
    };
    let disk = fresh_disk();
    let mut kernel = Kernel::new(disk.clone(), console, boot);
    let mut ctx = Context::default();
    kernel.start(&mut ctx);

    kernel.format();
    let fd = kernel.open("/a", OpenFlag::RDWR.into()).unwrap();
    kernel.fd_write(fd, b"old world").unwrap();

    // 重新格式化后旧描述符作废，残存句柄写不穿新镜像
    kernel.format();
    assert_eq!(
        kernel.fd_write(fd, b"ghost"),
        Err(KernelError::BadDescriptor)
    );
    assert_eq!(kernel.open_file_count(), 0);

    // 设备上是一张干净的新镜像，旧文件没有借尸还魂
    let fs = ChainFileSystem::load(disk).unwrap();
    assert!(Inode::root(&fs).find("a").is_none());
}

#[test]
fn open_flags_gate_read_write() {
    let (mut kernel, _, _) = boot();
    kernel.format();

    let wr = kernel.open("/t", OpenFlag::WRONLY.into()).unwrap();
    assert_eq!(kernel.fd_write(wr, b"secret").unwrap(), 6);
    assert_eq!(
        kernel.fd_read(wr, &mut [0u8; 4]),
        Err(KernelError::BadDescriptor)
    );

    let rd = kernel.open("/t", BitFlags::empty()).unwrap();
    let mut buf = [0u8; 6];
    assert_eq!(kernel.fd_read(rd, &mut buf).unwrap(), 6);
    assert_eq!(&buf, b"secret");
    assert_eq!(
        kernel.fd_write(rd, b"nope"),
        Err(KernelError::BadDescriptor)
    );

    // TRUNC 先截断再交给用户
    let tr = kernel.open("/t", OpenFlag::TRUNC.into()).unwrap();
    assert_eq!(kernel.fd_read(tr, &mut buf).unwrap(), 0);
}

#[test]
fn lseek_and_tell_move_the_cursor() {
    let (mut kernel, _, _) = boot();
    kernel.format();

    let fd = kernel.open("/c", OpenFlag::RDWR.into()).unwrap();
    let data: Vec<u8> = (0u8..100).collect();
    kernel.fd_write(fd, &data).unwrap();
    assert_eq!(kernel.tell(fd).unwrap(), 100);

    assert_eq!(kernel.lseek(fd, -10, SeekFrom::End).unwrap(), 90);
    let mut buf = [0u8; 10];
    assert_eq!(kernel.fd_read(fd, &mut buf).unwrap(), 10);
    assert_eq!(&buf[..], &data[90..]);

    assert_eq!(kernel.lseek(fd, -50, SeekFrom::Cur).unwrap(), 50);
    assert_eq!(kernel.tell(fd).unwrap(), 50);

    assert_eq!(kernel.lseek(fd, -1, SeekFrom::Set), Err(KernelError::BadSeek));
}

#[test]
fn mount_happens_at_start() {
    let device = fresh_disk();
    drop(ChainFileSystem::format(device.clone()));

    let console = Arc::new(BufferedConsole::default());
    let boot = BootConfig {
        init_entry: INIT_ENTRY,
        programs: vec![INIT_ENTRY],
        stack_base: STACK_BASE,
    };
    let mut kernel = Kernel::new(device, console, boot);
    let mut ctx = Context::default();
    kernel.start(&mut ctx);

    assert!(kernel.mounted().is_some());
    assert_eq!(ctx.pc, INIT_ENTRY);
    assert_eq!(ctx.sp, STACK_BASE);
}

/* ---------- 系统调用层 ---------- */

fn sys(kernel: &mut Kernel, ctx: &mut Context, mem: &mut [u8], id: u32, args: [u32; 3]) -> i32 {
    ctx.gpr[..3].copy_from_slice(&args);
    kernel.handle_syscall(id, ctx, mem);
    ctx.gpr[0] as i32
}

#[test]
fn syscall_console_write_and_read() {
    let (mut kernel, mut ctx, console) = boot();
    let mut mem = vec![0u8; 0x1000];

    mem[0x100..0x10b].copy_from_slice(b"hello world");
    let n = sys(&mut kernel, &mut ctx, &mut mem, syscall::WRITE, [1, 0x100, 11]);
    assert_eq!(n, 11);
    assert_eq!(console.take_output(), b"hello world");

    console.feed_input(b"ok");
    let n = sys(&mut kernel, &mut ctx, &mut mem, syscall::READ, [0, 0x200, 8]);
    assert_eq!(n, 2);
    assert_eq!(&mem[0x200..0x202], b"ok");

    // 越界缓冲区换来 BadAddress
    let e = sys(&mut kernel, &mut ctx, &mut mem, syscall::WRITE, [1, 0xff0, 0x100]);
    assert_eq!(e, KernelError::BadAddress.code());
}

#[test]
fn syscall_file_roundtrip() {
    let (mut kernel, mut ctx, _) = boot();
    let mut mem = vec![0u8; 0x1000];

    assert_eq!(sys(&mut kernel, &mut ctx, &mut mem, syscall::FORMAT, [0; 3]), 0);

    // 路径以 NUL 结尾放在用户内存里；文件描述符从 3 起步
    mem[..6].copy_from_slice(b"/data\0");
    let fd = sys(&mut kernel, &mut ctx, &mut mem, syscall::OPEN, [0, 2, 0]);
    assert_eq!(fd, 3);
    let fd = fd as u32;

    mem[0x100..0x10b].copy_from_slice(b"hello block");
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::WRITE, [fd, 0x100, 11]),
        11
    );
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::TELL, [fd, 0, 0]),
        11
    );
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::SEEK, [fd, 0, 0]),
        0
    );
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::READ, [fd, 0x200, 11]),
        11
    );
    assert_eq!(&mem[0x200..0x20b], b"hello block");

    assert_eq!(sys(&mut kernel, &mut ctx, &mut mem, syscall::CLOSE, [fd, 0, 0]), 0);
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::CLOSE, [fd, 0, 0]),
        KernelError::BadDescriptor.code()
    );

    // 裸块读：超级块开头是魔数
    assert_eq!(
        sys(&mut kernel, &mut ctx, &mut mem, syscall::BLOCK_READ, [1, 0x400, 0]),
        0
    );
    assert_eq!(&mem[0x400..0x404], &MAGIC.to_le_bytes());
}

#[test]
fn syscall_fork_and_shutdown() {
    let (mut kernel, mut ctx, _) = boot();
    let mut mem = vec![0u8; 0x100];

    let child = sys(&mut kernel, &mut ctx, &mut mem, syscall::FORK, [0; 3]);
    assert_eq!(child, 1);

    // 保留 pid 配 SIGKILL 等价于全体停机
    assert_eq!(
        sys(
            &mut kernel,
            &mut ctx,
            &mut mem,
            syscall::KILL,
            [SHUTDOWN_PID, Signal::Kill as u32, 0]
        ),
        0
    );
    assert_eq!(kernel.state_of(1), ProcessState::Terminated);
    assert_eq!(kernel.state_of(0), ProcessState::Executing);

    let e = sys(&mut kernel, &mut ctx, &mut mem, syscall::KILL, [1, 99, 0]);
    assert_eq!(e, KernelError::InvalidSignal.code());

    let e = sys(&mut kernel, &mut ctx, &mut mem, 0x7f, [0; 3]);
    assert_eq!(e, KernelError::UnknownSyscall.code());
}
