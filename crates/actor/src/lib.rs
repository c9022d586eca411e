//! A lightweight actor framework.
//!
//! An actor owns its state exclusively and handles one message at a time
//! on a tokio task. Other tasks talk to it through a cloneable [`Actor`]
//! handle, either fire-and-forget ([`Actor::send`]) or request/reply
//! ([`Actor::call`]).

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod macros;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::Actor;
pub use mailbox::{Message, Request};

#[cfg(test)]
mod tests {
    use super::*;

    define_actor! {
        /// This is a test actor.
        #[wrapper_type(Counter)]
        #[derive(Default)]
        struct CounterState {
            value: u32,
        }
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<CounterState> for Add {
        fn handle(self, state: &mut CounterState, _handle: &Actor<CounterState>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Get;

    impl Request<CounterState> for Get {
        type Reply = u32;

        fn handle(
            self,
            state: &mut CounterState,
            _handle: &Actor<CounterState>,
        ) -> u32 {
            state.value
        }
    }

    /// Re-sends itself through the handle until the counter reaches the
    /// target.
    #[derive(Debug)]
    struct CountTo(u32);

    impl Message<CounterState> for CountTo {
        fn handle(self, state: &mut CounterState, handle: &Actor<CounterState>) {
            if state.value < self.0 {
                state.value += 1;
                handle.send(CountTo(self.0)).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_send_then_call() {
        let counter = Counter::spawn(CounterState::default(), None);
        counter.handle().send(Add(40)).unwrap();
        counter.handle().send(Add(2)).unwrap();
        assert_eq!(counter.handle().call(Get).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_message_can_reach_own_actor() {
        let counter = Counter::spawn(CounterState::default(), Some("counter"));
        counter.handle().send(CountTo(5)).unwrap();
        // Poll until the chain of self-sent messages has finished.
        let mut value = 0;
        for _ in 0..100 {
            value = counter.handle().call(Get).await.unwrap();
            if value == 5 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_killed_actor_rejects_messages() {
        let counter = Counter::spawn(CounterState::default(), None);
        counter.handle().try_kill();
        assert_eq!(counter.handle().send(Add(1)), Err(ActorDeadError));
        assert_eq!(counter.clone().handle().call(Get).await, Err(ActorDeadError));
    }
}
