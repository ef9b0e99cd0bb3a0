//! Code-table macro shared by [`NodeProfile`](crate::profile::NodeProfile) and
//! [`AttributeType`](crate::attribute_type::AttributeType).
//!
//! Hub codes form an open vocabulary: the hub may report values this crate
//! has never heard of, so the generated type is a transparent newtype with
//! named constants rather than a closed enum. The name table is a `match`
//! generated at compile time.

macro_rules! define_codes {
    (
        $(#[doc = $doc:expr])*
        $name:ident {
            $( $variant:ident = $code:literal, )*
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u16);

        #[allow(missing_docs)]
        impl $name {
            $( pub const $variant: Self = Self($code); )*

            /// Every named code, in declaration order.
            pub const ALL: &'static [Self] = &[$( Self::$variant ),*];

            /// Raw numeric code.
            #[must_use]
            pub const fn code(self) -> u16 {
                self.0
            }

            /// Symbolic name of a known code, `None` for codes outside the table.
            #[must_use]
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $code => Some(stringify!($variant)), )*
                    _ => None,
                }
            }

            /// Whether the code is part of the known table.
            #[must_use]
            pub const fn is_known(self) -> bool {
                self.name().is_some()
            }
        }

        impl From<u16> for $name {
            fn from(code: u16) -> Self {
                Self(code)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }
    };
}

pub(crate) use define_codes;
