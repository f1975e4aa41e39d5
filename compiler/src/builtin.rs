//! The built-in dictionary model.
//!
//! Declares the `d` namespace and one data type per native representation.
//! Every other model imports it to type its properties, so it is normally
//! the first model registered.

use crate::model::NativeType;
use dictum_core::RawModel;

pub const DICTIONARY_URI: &str = "http://www.dictum.dev/model/dictionary/1.0";
pub const DICTIONARY_PREFIX: &str = "d";
pub const DICTIONARY_MODEL: &str = "d:dictionary";

/// The raw descriptor of the dictionary model.
pub fn dictionary_model() -> RawModel {
    let mut model = RawModel::new(DICTIONARY_MODEL)
        .with_description("Built-in data types")
        .with_version("1.0");
    model.create_namespace(DICTIONARY_URI, DICTIONARY_PREFIX);
    for native in NativeType::ALL {
        model.create_data_type(
            format!("{}:{}", DICTIONARY_PREFIX, native.keyword()),
            native.keyword(),
        );
    }
    model
}
