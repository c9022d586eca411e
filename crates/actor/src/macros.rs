/// Defines a new actor type.
///
/// Use this macro to both define an actor's state type and wrapper type.
/// The wrapper type can later have `impl` blocks to add some convenient
/// methods to interact with the actor.
///
/// Doc comments go first and are attached to the wrapper type. They must
/// be followed by `#[wrapper_type(Name)]`; any remaining attributes are
/// attached to the state type.
#[macro_export]
macro_rules! define_actor {
    {
        $(#[doc = $doc:expr])*
        #[wrapper_type($wrapper_type:ident)]
        $(#[$state_attrs:meta])*
        $v:vis struct $state_type:ident {
            $($state_items:tt)*
        }
    } => {
        $(#[$state_attrs])*
        struct $state_type {
            $($state_items)*
        }

        $(#[doc = $doc])*
        $v struct $wrapper_type {
            handle: $crate::Actor<$state_type>
        }

        impl $wrapper_type {
            #[inline]
            fn spawn(
                state: $state_type,
                label: Option<&str>
            ) -> $wrapper_type {
                let handle = $crate::Actor::spawn(state, label);
                $wrapper_type {
                    handle
                }
            }

            #[inline]
            fn handle(&self) -> &$crate::Actor<$state_type> {
                &self.handle
            }
        }

        impl Clone for $wrapper_type {
            fn clone(&self) -> Self {
                $wrapper_type {
                    handle: self.handle.clone()
                }
            }
        }
    };
}
