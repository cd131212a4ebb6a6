use std::fmt;

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Creates a handle from a container index.
            pub fn new(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            /// Returns the index into the owning container.
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

index_handle! {
    /// A non-owning link to a layer in the same composition's layer list.
    LayerRef
}

index_handle! {
    /// A non-owning link to a mask in the owning layer's mask list.
    MaskRef
}

index_handle! {
    /// A non-owning link to a composition in the file's composition list.
    CompositionRef
}
