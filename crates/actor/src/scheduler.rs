use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::mailbox::Mailbox;
use crate::{Actor, Message};

pub async fn run_actor<S: Send + Sync + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    let mut handled = 0u64;
    loop {
        let msg = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            msg = msg_rx.recv() => {
                let Some(msg) = msg else {
                    break;
                };
                msg
            }
        };
        trace!("received message: {msg:?}");

        let Some(mailbox) = mailbox.upgrade() else {
            warn!("last mailbox has been dropped, discard the message");
            break;
        };

        trace_span!("proc msg").in_scope(|| {
            msg.handle(&mut state, &Actor::from_mailbox(mailbox));
        });
        handled += 1;
    }

    // Pending messages are dropped together with the receiver, which
    // releases callers still waiting for a reply.
    msg_rx.close();
    debug!("will terminate after handling {handled} messages");
}
