//! Newtype IDs for type-safe entity references.
//!
//! The backend issues opaque string identifiers (document IDs), so every ID
//! wraps a `String`. Use the `define_id!` macro to create wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `From<String>`, `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use knotwork_core::define_id;
/// define_id!(RugId);
/// define_id!(WeaverId);
///
/// let rug = RugId::new("64f1c0ffee");
/// let weaver = WeaverId::new("64f1c0ffee");
/// assert_eq!(rug.as_str(), weaver.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: RugId = weaver;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Returns true if the backend did not provide an ID.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(VariantId);
define_id!(SizeId);
define_id!(OrderId);
define_id!(CollectionId);
define_id!(BlogId);
define_id!(PortfolioId);
define_id!(VideoId);
define_id!(BespokeId);
define_id!(ContactId);
define_id!(SubscriberId);
define_id!(ReviewId);
define_id!(WishlistItemId);
define_id!(CustomerId);
define_id!(AdminUserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrips_as_plain_string() {
        let id = ProductId::new("65a1b2c3");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"65a1b2c3\"");

        let parsed: ProductId = serde_json::from_str("\"65a1b2c3\"").unwrap_or_default();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display_and_empty() {
        assert_eq!(OrderId::from("abc").to_string(), "abc");
        assert!(OrderId::default().is_empty());
    }
}
