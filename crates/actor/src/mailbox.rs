use std::fmt::{self, Debug};
use std::marker::PhantomData;

use tokio::sync::{mpsc, oneshot, watch};

use crate::{Actor, ActorDeadError};

/// Helper trait for handling boxed messages.
pub trait BoxMessage<S>: Send + Debug + 'static {
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>);
}

/// The message that an actor can handle.
pub trait Message<S>: BoxMessage<S> {
    /// Handles the message with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>);
}

impl<S, M: Message<S>> BoxMessage<S> for M {
    #[inline]
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>) {
        (*self).handle(state, handle)
    }
}

impl<S, M: Message<S> + ?Sized> Message<S> for Box<M> {
    #[inline]
    fn handle(self, state: &mut S, handle: &Actor<S>) {
        self.handle_box(state, handle)
    }
}

/// A message that produces a reply for its sender.
///
/// Requests are processed in mailbox order together with plain messages,
/// so a reply always reflects every message sent before the request.
pub trait Request<S>: Send + Debug + 'static {
    /// The type of the reply.
    type Reply: Send + 'static;

    /// Handles the request with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>) -> Self::Reply;
}

pub(crate) struct Envelope<S, R: Request<S>> {
    request: R,
    reply_tx: oneshot::Sender<R::Reply>,
    _state: PhantomData<fn(&mut S)>,
}

impl<S, R: Request<S>> Envelope<S, R> {
    #[inline]
    pub fn new(request: R, reply_tx: oneshot::Sender<R::Reply>) -> Self {
        Self {
            request,
            reply_tx,
            _state: PhantomData,
        }
    }
}

impl<S, R: Request<S>> Debug for Envelope<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Envelope").field(&self.request).finish()
    }
}

impl<S: 'static, R: Request<S>> Message<S> for Envelope<S, R> {
    #[inline]
    fn handle(self, state: &mut S, handle: &Actor<S>) {
        let reply = self.request.handle(state, handle);
        if self.reply_tx.send(reply).is_err() {
            trace!("caller went away before the reply");
        }
    }
}

pub struct MailboxParts<S> {
    pub mailbox: Mailbox<S>,
    pub msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    pub kill_rx: watch::Receiver<bool>,
}

pub struct Mailbox<S> {
    msg_tx: mpsc::UnboundedSender<Box<dyn Message<S>>>,
    kill_tx: watch::Sender<bool>,
}

impl<S: Send + Sync + 'static> Mailbox<S> {
    #[inline]
    pub fn new() -> MailboxParts<S> {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { msg_tx, kill_tx },
            msg_rx,
            kill_rx,
        }
    }

    #[inline]
    pub fn send(&self, msg: Box<dyn Message<S>>) -> Result<(), ActorDeadError> {
        if *self.kill_tx.borrow() {
            return Err(ActorDeadError);
        }
        self.msg_tx.send(msg).map_err(|_| ActorDeadError)
    }

    #[inline]
    pub fn try_kill(&self) {
        self.kill_tx.send_replace(true);
    }
}
