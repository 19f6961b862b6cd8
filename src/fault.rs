//! Module that turns operator signals into token loss requests.
//!
//! SIGUSR1 asks the member to lose its next PING, SIGUSR2 its next PONG.

use crate::{log, sync::LossRequests, token::TokenKind};
use color_print::cformat;
use std::io;
use tokio::{
    signal::unix::{signal, SignalKind},
    task::JoinHandle,
};

pub fn spawn_signal_injector(losses: LossRequests) -> io::Result<JoinHandle<()>> {
    let mut lose_ping = signal(SignalKind::user_defined1())?;
    let mut lose_pong = signal(SignalKind::user_defined2())?;

    Ok(tokio::spawn(async move {
        loop {
            let kind = tokio::select! {
                Some(()) = lose_ping.recv() => TokenKind::Ping,
                Some(()) = lose_pong.recv() => TokenKind::Pong,
                else => break,
            };

            if losses.request(kind).await {
                log::warn(&cformat!("Asked to lose the next <bold>{kind}</bold> token."));
            } else {
                log::debug(&cformat!("A <bold>{kind}</bold> loss is already pending."));
            }
        }
    }))
}
