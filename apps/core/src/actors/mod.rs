//! Long-running tasks reached through cloneable handles.
//!
//! - `llm`: chat completions against the inference API
//! - `recorder`: background persistence of selected responses

pub mod llm;
pub mod messages;
pub mod recorder;
pub mod traits;
