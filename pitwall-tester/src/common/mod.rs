pub mod util;

pub use util::{load_race_config, split_csv, usize_to_f64};
