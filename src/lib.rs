pub mod assembly;
pub mod debruijn;
pub mod model;
pub mod test_utils;
pub mod utils;
pub mod visualisation;

extern crate hashlink;
extern crate itertools;

#[macro_use]
extern crate log;
