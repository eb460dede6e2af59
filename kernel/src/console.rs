//! 字符控制台的接口层；UART 编程在内核之外

/// 描述符 0/1/2 背后的字符设备
pub trait Console: Send + Sync {
    fn putchar(&self, c: u8);

    /// 非阻塞读，无输入时返回 `None`
    fn getchar(&self) -> Option<u8>;
}
