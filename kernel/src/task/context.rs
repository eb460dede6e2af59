//! 执行上下文：寄存器堆快照。
//!
//! 进程不在运行时由其 PCB 独占持有；运行期间活在陷入帧里，
//! 由调度器在切换时双向拷贝。

/// 陷入帧与 PCB 共用的寄存器快照
#[repr(C)]
#[derive(Debug, Default, Clone)]
pub struct Context {
    /// 通用寄存器；`gpr[0]` 兼作系统调用的参数与返回值
    pub gpr: [u32; 13],
    pub sp: u32,
    pub lr: u32,
    pub pc: u32,
    /// 处理器状态字
    pub psr: u32,
}

impl Context {
    /// 把结果码写进返回值寄存器
    #[inline]
    pub fn set_return(&mut self, value: i32) {
        self.gpr[0] = value as u32;
    }
}
