//! Module that contains the link a member uses to pass tokens to its successor.

use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("the link to the next member is closed")]
    Closed,
}

/// Struct that pairs the outbound link to the successor with the local inbox.
///
/// Whatever feeds the inbox (a TCP reader, or another member in the same process)
/// buffers arrivals until the member polls or waits on it.
pub struct TokenChannel {
    outbox: UnboundedSender<String>,
    inbox: UnboundedReceiver<String>,
    tasks: Vec<JoinHandle<()>>,
}

impl TokenChannel {
    pub fn new(outbox: UnboundedSender<String>, inbox: UnboundedReceiver<String>) -> Self {
        Self {
            outbox,
            inbox,
            tasks: Vec::new(),
        }
    }

    /// Function that ties the lifetime of transport tasks to this channel.
    pub fn with_tasks(mut self, tasks: Vec<JoinHandle<()>>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Function that builds `n` channels wired in a ring: member `i` sends to member `(i + 1) % n`.
    pub fn ring(n: usize) -> Vec<Self> {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..n).map(|_| mpsc::unbounded_channel::<String>()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(i, inbox)| Self::new(senders[(i + 1) % n].clone(), inbox))
            .collect()
    }

    pub fn send(&self, raw: String) -> Result<(), ChannelError> {
        self.outbox.send(raw).map_err(|_| ChannelError::Closed)
    }

    pub fn try_receive(&mut self) -> Option<String> {
        match self.inbox.try_recv() {
            Ok(raw) => Some(raw),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Function that waits until a message arrives. Returns `None` once nothing can arrive anymore.
    pub async fn receive(&mut self) -> Option<String> {
        self.inbox.recv().await
    }

    /// Function that stops the transport tasks and refuses further arrivals.
    pub fn close(&mut self) {
        self.inbox.close();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for TokenChannel {
    fn drop(&mut self) {
        self.close();
    }
}
