//! Workbook data model
pub mod authorization;
pub mod certificate;
pub mod data_set;
pub mod identifiable;
pub mod name_value_pair;
pub mod proxy;
pub mod request;
pub mod scenario;
pub mod selection;
pub mod variable;
pub mod workbook;
pub mod workbook_default_parameters;

pub use authorization::*;
pub use certificate::*;
pub use data_set::*;
pub use identifiable::*;
pub use name_value_pair::*;
pub use proxy::*;
pub use request::*;
pub use scenario::*;
pub use selection::*;
pub use variable::*;
pub use workbook::*;
pub use workbook_default_parameters::*;
