mod command_input;
mod confirm;
mod filter_input;
mod input;
mod key_result;
mod status_picker;
mod vacancy_detail;
mod vacancy_table;

pub use command_input::CommandInput;
pub use confirm::ConfirmDelete;
pub use filter_input::{FilterEvent, FilterInput};
pub use key_result::KeyResult;
pub use status_picker::StatusPicker;
pub use vacancy_detail::draw_vacancy_detail;
pub use vacancy_table::draw_vacancy_table;
