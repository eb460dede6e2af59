//! # 消息通道
//!
//! 定长表里的具名信箱，深度恒为 1。发送与接收都不阻塞，
//! 满或空直接报错，调用方以重发系统调用的方式实现等待。

use crate::error::{KernelError, KernelResult};
use crate::Kernel;

/// 深度为 1 的具名信箱
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Channel {
    /// 通道名；0 表示槽位未被认领
    name: u32,
    message: Option<u32>,
    last_sender: u32,
    last_receiver: u32,
}

impl Kernel {
    /// 按名字打开通道：已有同名通道则复用，否则认领最小的
    /// 空槽位，返回通道描述符（槽位下标）
    pub fn channel_open(&mut self, name: u32) -> KernelResult<u32> {
        if name == 0 {
            return Err(KernelError::InvalidChannel);
        }

        if let Some(index) = self.channels.iter().position(|c| c.name == name) {
            return Ok(index as u32);
        }

        let index = self
            .channels
            .iter()
            .position(|c| c.name == 0)
            .ok_or(KernelError::NoChannelSlot)?;
        self.channels[index].name = name;
        Ok(index as u32)
    }

    /// 投递一条消息；通道里还压着未取走的消息时失败
    pub fn channel_send(&mut self, index: u32, message: u32) -> KernelResult<()> {
        let sender = self.current as u32;
        let channel = self.claimed_channel(index)?;

        if channel.message.is_some() {
            return Err(KernelError::ChannelFull);
        }
        channel.message = Some(message);
        channel.last_sender = sender;
        Ok(())
    }

    /// 取走消息。空通道失败；上一条消息正是自己发出的也失败，
    /// 防止进程从陈旧槽位读回自己未被消费的发送。
    pub fn channel_receive(&mut self, index: u32) -> KernelResult<u32> {
        let receiver = self.current as u32;
        let channel = self.claimed_channel(index)?;

        match channel.message {
            Some(message) if channel.last_sender != receiver => {
                channel.message = None;
                channel.last_receiver = receiver;
                Ok(message)
            }
            _ => Err(KernelError::ChannelEmpty),
        }
    }

    /// 最近一次成功收发的双方 pid，诊断用
    pub fn channel_peers(&self, index: u32) -> Option<(u32, u32)> {
        self.channels
            .get(index as usize)
            .filter(|c| c.name != 0)
            .map(|c| (c.last_sender, c.last_receiver))
    }

    fn claimed_channel(&mut self, index: u32) -> KernelResult<&mut Channel> {
        let channel = self
            .channels
            .get_mut(index as usize)
            .ok_or(KernelError::InvalidChannel)?;
        if channel.name == 0 {
            return Err(KernelError::InvalidChannel);
        }
        Ok(channel)
    }
}
