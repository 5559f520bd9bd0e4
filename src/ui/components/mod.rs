mod command_overlay;
mod form_panel;
mod input;
mod key_result;
mod search_input;

pub use command_overlay::render_command_overlay;
pub use form_panel::{FormEvent, FormMode, FormPanel};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
