//! `define_port_error!`: thiserror enums whose variants each carry a
//! `message`, with a snake-case constructor per variant.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum StoreError {
//!         Connection => "store unreachable: {message}",
//!     }
//! }
//! assert_eq!(StoreError::connection("refused").to_string(), "store unreachable: refused");
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { message: String },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant { message: message.into() }
                    }
                }
            )*

            /// Adapter-supplied detail, without the variant prefix.
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant { message } => message, )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum ProbeError {
            Connection => "connection: {message}",
            RateLimited => "slow down: {message}",
        }
    }

    #[test]
    fn constructors_accept_borrowed_text() {
        let err = ProbeError::connection("refused");
        assert_eq!(err.to_string(), "connection: refused");
        assert_eq!(err.message(), "refused");
    }

    #[test]
    fn multi_word_variants_get_snake_case_constructors() {
        assert_eq!(
            ProbeError::rate_limited("later"),
            ProbeError::RateLimited {
                message: "later".to_owned()
            }
        );
    }
}
