//! Gift card codes and naming.

mod code;

pub use code::{
    CODE_BYTES, CODE_LEN, default_card_name, generate_code, is_well_formed, normalize_code,
};
