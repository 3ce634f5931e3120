//! Internal macros for the repetitive parts of the DSL types

/// Generates chainable `with_*` setters that wrap the argument in `Some`.
///
/// `impl Into<String>` setters store `None` for blank strings.
///
/// ```ignore
/// with_setters!(TermQuery {
///     with_boost => params.boost: f64,
///     with_name => params.name: impl Into<String>,
/// });
/// ```
macro_rules! with_setters {
    (@items) => {};
    (@items $(#[$meta:meta])* $name:ident => $($path:ident).+ : impl Into<String> $(, $($rest:tt)*)?) => {
        $(#[$meta])*
        pub fn $name(mut self, value: impl Into<String>) -> Self {
            self.$($path).+ = $crate::util::non_blank(&value.into());
            self
        }
        with_setters!(@items $($($rest)*)?);
    };
    (@items $(#[$meta:meta])* $name:ident => $($path:ident).+ : $arg:ty $(, $($rest:tt)*)?) => {
        $(#[$meta])*
        pub fn $name(mut self, value: $arg) -> Self {
            self.$($path).+ = Some(value.into());
            self
        }
        with_setters!(@items $($($rest)*)?);
    };
    ($ty:ty { $($body:tt)* }) => {
        impl $ty {
            with_setters!(@items $($body)*);
        }
    };
}

/// Generates `&mut self` setters for closure-configured DSL holders.
macro_rules! mut_setters {
    (@items) => {};
    (@items $(#[$meta:meta])* $name:ident => $($path:ident).+ : impl Into<String> $(, $($rest:tt)*)?) => {
        $(#[$meta])*
        pub fn $name(&mut self, value: impl Into<String>) -> &mut Self {
            self.$($path).+ = $crate::util::non_blank(&value.into());
            self
        }
        mut_setters!(@items $($($rest)*)?);
    };
    (@items $(#[$meta:meta])* $name:ident => $($path:ident).+ : $arg:ty $(, $($rest:tt)*)?) => {
        $(#[$meta])*
        pub fn $name(&mut self, value: $arg) -> &mut Self {
            self.$($path).+ = Some(value.into());
            self
        }
        mut_setters!(@items $($($rest)*)?);
    };
    ($ty:ty { $($body:tt)* }) => {
        impl $ty {
            mut_setters!(@items $($body)*);
        }
    };
}
