//! Parameter updates travelling from any thread to the draw thread.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::FilterError;
use crate::params::BlurSize;

/// A deferred parameter change. Applied in enqueue order right before the
/// next draw, so the most recent value of each parameter wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterCommand {
    SetBlurSize(BlurSize),
    /// Focus position in output pixels, origin top-left.
    Focus { x: f32, y: f32 },
    /// `None` restores normal output.
    SetDebugLog(Option<f32>),
    Resize { width: u32, height: u32 },
}

/// Cloneable sender side of a filter's command queue.
///
/// ```
/// # use tiltshift::FilterHandle;
/// # fn on_touch(handle: &FilterHandle, x: f32, y: f32) -> Result<(), tiltshift::FilterError> {
/// handle.focus(x, y)?;
/// handle.set_blur_size(2.0)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilterHandle {
    sender: Sender<FilterCommand>,
}

impl FilterHandle {
    pub fn send(&self, command: FilterCommand) -> Result<(), FilterError> {
        self.sender
            .send(command)
            .map_err(|_| FilterError::QueueDisconnected)
    }

    /// Validates `blur_size` on the calling thread, then enqueues it.
    pub fn set_blur_size(&self, blur_size: f32) -> Result<(), FilterError> {
        self.send(FilterCommand::SetBlurSize(BlurSize::new(blur_size)?))
    }

    pub fn focus(&self, x: f32, y: f32) -> Result<(), FilterError> {
        self.send(FilterCommand::Focus { x, y })
    }

    pub fn set_debug_log(&self, value: Option<f32>) -> Result<(), FilterError> {
        self.send(FilterCommand::SetDebugLog(value))
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<(), FilterError> {
        self.send(FilterCommand::Resize { width, height })
    }
}

/// Receiver side, owned by the filter on the draw thread.
pub(crate) struct CommandQueue {
    sender: Sender<FilterCommand>,
    receiver: Receiver<FilterCommand>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub(crate) fn handle(&self) -> FilterHandle {
        FilterHandle {
            sender: self.sender.clone(),
        }
    }

    /// Everything enqueued so far, oldest first. Never blocks.
    pub(crate) fn drain(&self) -> impl Iterator<Item = FilterCommand> + '_ {
        self.receiver.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_enqueue_order() {
        let queue = CommandQueue::new();
        let handle = queue.handle();
        handle.set_blur_size(1.0).unwrap();
        handle.focus(10.0, 20.0).unwrap();
        handle.set_blur_size(3.0).unwrap();

        let commands: Vec<_> = queue.drain().collect();
        assert_eq!(
            commands,
            vec![
                FilterCommand::SetBlurSize(BlurSize::new(1.0).unwrap()),
                FilterCommand::Focus { x: 10.0, y: 20.0 },
                FilterCommand::SetBlurSize(BlurSize::new(3.0).unwrap()),
            ]
        );
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn invalid_blur_size_is_rejected_before_enqueue() {
        let queue = CommandQueue::new();
        let handle = queue.handle();
        assert_eq!(
            handle.set_blur_size(-1.0),
            Err(FilterError::InvalidBlurSize(-1.0))
        );
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn handles_work_from_other_threads() {
        let queue = CommandQueue::new();
        let handle = queue.handle();
        std::thread::spawn(move || handle.focus(1.0, 2.0).unwrap())
            .join()
            .unwrap();
        assert_eq!(
            queue.drain().collect::<Vec<_>>(),
            vec![FilterCommand::Focus { x: 1.0, y: 2.0 }]
        );
    }
}
