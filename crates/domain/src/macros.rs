//! Macro for string conversions of status enums
//!
//! Slot states, segment statuses and transition kinds all render as short
//! snake_case labels in reports and parse back case-insensitively from
//! configuration or test fixtures. The macro generates the three pieces
//! every such enum needs.
//!
//! # Example
//!
//! ```rust
//! use slotline_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Outcome {
//!     Booked,
//!     Unused,
//! }
//!
//! impl_domain_status_conversions!(Outcome {
//!     Booked => "booked",
//!     Unused => "unused",
//! });
//!
//! assert_eq!(Outcome::Booked.as_str(), "booked");
//! assert_eq!("UNUSED".parse::<Outcome>(), Ok(Outcome::Unused));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless status enum
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase labels
///
/// Parsing ignores ASCII case and reports the enum name on failure.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable lowercase label
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
