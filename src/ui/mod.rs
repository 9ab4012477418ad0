//! Terminal output for the CLI
//!
//! `cliclack` formatting in an interactive terminal, plain lines in CI or
//! when stdout is piped, and nothing but the payload with `--format json`.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, section, ship_image, step_error_detail,
    step_info, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
