//! Apicize workbook transcoder.
//!
//! This library converts Apicize workbooks into editable TypeScript test
//! projects and imports edited projects back into workbooks
pub mod batch;
pub mod diff;
pub mod errors;
pub mod serialization;
pub mod settings;
pub mod transcode;
pub mod types;
pub mod utility;
pub mod validator;
pub use batch::*;
pub use diff::*;
pub use errors::*;
pub use serialization::*;
pub use settings::*;
pub use transcode::*;
pub use types::*;
pub use utility::*;
pub use validator::*;
