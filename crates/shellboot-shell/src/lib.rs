#![allow(clippy::missing_errors_doc)]

mod activation;
mod fragment;
mod line_editing;
mod prompt;
mod shell;

pub use activation::{ActivationError, ActivationScript};
pub use fragment::{CompiledPrompt, MAX_FRAGMENT_BYTES};
pub use line_editing::{EditMode, LineEditing};
pub use prompt::{
    ConfigLocation, OhMyPosh, PromptEngine, PromptError, PromptOptions, initialize_prompt,
};
pub use shell::{ShellKind, UnknownShell};
