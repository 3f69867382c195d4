//! Option schemas, values and resolution.
//!
//! Every table, column and filter type declares its options into a shared
//! [`OptionsSchema`], root type first. The merged schema then resolves the
//! caller's [`Options`] into [`ResolvedOptions`].

mod callback;
mod resolved;
mod resolver;
mod schema;
mod value;

pub use callback::{
    Callback, CallbackKind, ClientFn, FilterDataFn, FilterLabelFn, FilterServerFn, FilterValidationFn,
    LinkFn, MappingFn, OrderServerFn, RowFn, SearchServerFn, ValueFn,
};
pub use resolved::ResolvedOptions;
pub use resolver::Resolution;
pub use schema::{AllowedValue, OptionType, OptionsSchema};
pub use value::{truthy, OptionValue, Options};
